use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub package_name: String,
    pub task_name: String,
}

/// Find `anchor` among the `/`-separated segments of `path` and take the two
/// segments after it as package and task.
pub fn resolve_labels(path: &str, anchor: &str) -> Result<Labels, IngestError> {
    let segments: Vec<&str> = path.split('/').filter(|seg| !seg.is_empty()).collect();
    let Some(pos) = segments.iter().position(|seg| *seg == anchor) else {
        return Err(IngestError::PathResolutionError {
            path: path.to_string(),
            detail: format!("anchor segment {anchor:?} not found"),
        });
    };
    // The final segment is the filename, never a label.
    let directories = segments[pos + 1..]
        .split_last()
        .map(|(_, dirs)| dirs)
        .unwrap_or(&[]);
    if directories.len() < 2 {
        return Err(IngestError::PathResolutionError {
            path: path.to_string(),
            detail: format!(
                "anchor {anchor:?} at segment {pos} is followed by {} director{}, need 2",
                directories.len(),
                if directories.len() == 1 { "y" } else { "ies" }
            ),
        });
    }
    Ok(Labels {
        package_name: directories[0].to_string(),
        task_name: directories[1].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_two_segments_after_anchor() {
        let labels = resolve_labels(
            "logs/snippets/Plots/plot_line/h_2024-01-31_1.9.4_box.precompile",
            "snippets",
        )
        .unwrap();
        assert_eq!(labels.package_name, "Plots");
        assert_eq!(labels.task_name, "plot_line");
    }

    #[test]
    fn first_anchor_wins() {
        let labels = resolve_labels("snippets/A/snippets/x.task", "snippets").unwrap();
        assert_eq!(labels.package_name, "A");
        assert_eq!(labels.task_name, "snippets");
    }

    #[test]
    fn missing_anchor_fails() {
        let err = resolve_labels("logs/Plots/plot_line/x.task", "snippets").unwrap_err();
        assert!(matches!(err, IngestError::PathResolutionError { .. }));
    }

    #[test]
    fn filename_is_not_a_label() {
        let err = resolve_labels("snippets/Plots/x.task", "snippets").unwrap_err();
        match err {
            IngestError::PathResolutionError { path, detail } => {
                assert_eq!(path, "snippets/Plots/x.task");
                assert!(detail.contains("1 directory"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
