//! JSON decoding with error paths.

use crate::error::{LifecycleError, Result};
use serde::de::DeserializeOwned;

/// Decode `text` into `T`, naming the failing JSON path on error.
pub fn parse<T: DeserializeOwned>(text: &str, what: &str) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("OUTPUT START:\n\n{}\n\nOUTPUT END\n", text);
        LifecycleError::Parse {
            what: what.to_string(),
            path: e.path().to_string(),
            message: e.inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resource;

    #[test]
    fn test_parse_reports_path() {
        let err = parse::<Resource>(r#"{"id": "x", "name": 5, "type": "t"}"#, "resource")
            .unwrap_err();
        match err {
            LifecycleError::Parse { what, path, .. } => {
                assert_eq!(what, "resource");
                assert_eq!(path, "name");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
