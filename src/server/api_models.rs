use crate::catalog_store::Page;
use crate::errors::ServiceResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    pub fn page(&self) -> ServiceResult<Page> {
        Page::new(self.skip, self.limit)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
