//! Report exporters consuming a sealed `RunReport`

pub mod csv;
pub mod dump;
pub mod json;

use crate::models::Token;
use std::path::PathBuf;

/// Directory for a token's exported artifacts: `results/{token}_{date}_corvus`
pub fn save_directory(token: &Token) -> PathBuf {
    let date = chrono::Local::now().format("%m_%d_%Y");
    PathBuf::from("results").join(format!("{token}_{date}_corvus"))
}
