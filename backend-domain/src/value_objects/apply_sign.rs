// Direction of an inventory update

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplySign {
    Add,
    Subtract,
}

impl ApplySign {
    pub fn factor(&self) -> i64 {
        match self {
            ApplySign::Add => 1,
            ApplySign::Subtract => -1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplySign::Add => "add",
            ApplySign::Subtract => "subtract",
        }
    }
}
