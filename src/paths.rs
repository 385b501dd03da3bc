//! The two path-composition helpers the rest of the crate builds every
//! artifact and intermediate path from. Both always join with `/`; the
//! platform collaborator is responsible for any backslash conversion a
//! target OS needs when actually invoking its APIs.

/// Strip a single leading and trailing `/` from a path segment, if present.
fn trim_segment(segment: &str) -> &str {
    segment.trim_matches('/')
}

fn join_segments(segments: &[&str]) -> String {
    let absolute = segments.iter().find(|s| !s.is_empty()).is_some_and(|s| s.starts_with('/'));
    let joined = segments
        .iter()
        .map(|s| trim_segment(s))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// `bp_path/build_folder/name.extension`, omitting any empty segment and
/// appending the extension with a `.` separator only if it is non-empty.
pub fn combine_entity_path(bp_path: &str, build_folder: &str, name: &str, extension: &str) -> String {
    let file_name = if extension.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{extension}")
    };
    join_segments(&[bp_path, build_folder, &file_name])
}

/// `bp_path/.bricks/name.extension`.
pub fn combine_intermediate_path(bp_path: &str, name: &str, extension: &str) -> String {
    let file_name = if extension.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{extension}")
    };
    join_segments(&[bp_path, ".bricks", &file_name])
}

/// `bp_path/subfolder/name`, used by the `sources` field — `subfolder` is
/// empty unless a preceding `/ "subfolder"` directive set it.
pub fn combine_source_path(bp_path: &str, subfolder: &str, name: &str) -> String {
    join_segments(&[bp_path, subfolder, name])
}

/// `bp_path/name`, used by the `include` field.
pub fn combine_include_path(bp_path: &str, name: &str) -> String {
    join_segments(&[bp_path, name])
}
