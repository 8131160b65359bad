//! Route rendering: encoded polyline in, SVG out

pub mod polyline;
pub mod svg;

pub use svg::RoutePath;

use crate::error::DecodeError;

/// Decode a summary polyline and project it onto the canvas.
pub fn project_route(encoded: &str) -> Result<RoutePath, DecodeError> {
    let points = polyline::decode(encoded, polyline::DEFAULT_PRECISION)?;
    tracing::debug!("Decoded {} route points", points.len());
    RoutePath::project(&points).ok_or(DecodeError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_route() {
        let path = project_route("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(path.points().len(), 3);
        assert!(path.path_data().starts_with("M "));
        assert_eq!(path.path_data().matches(" L ").count(), 2);
    }

    #[test]
    fn test_empty_polyline() {
        assert_eq!(project_route(""), Err(DecodeError::Empty));
    }

    #[test]
    fn test_malformed_polyline() {
        assert!(matches!(
            project_route("_p~iF"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_hostile_polyline_is_an_error() {
        let hostile = "~~~~~~~~~~~^".repeat(40);
        assert!(matches!(
            project_route(&hostile),
            Err(DecodeError::Malformed(_))
        ));
    }
}
