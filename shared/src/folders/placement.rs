//! Path splitting and the single placement step of folder insertion
//!
//! Everything here is pure: it looks at a segment list and the names/ids of
//! the current node's children and decides what the tree should do next.
//! The tree itself only applies the decision.

/// Delimiter between path segments in a folder name
pub const FOLDER_DELIMITER: char = '/';

/// Split a raw folder name into path segments.
///
/// Leading and trailing delimiter runs are stripped first. A name made only
/// of delimiters (or an empty name) yields no segments at all.
pub fn split_folder_name(raw: &str) -> Vec<String> {
    let trimmed = raw.trim_matches(FOLDER_DELIMITER);
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed
        .split(FOLDER_DELIMITER)
        .map(str::to_string)
        .collect()
}

/// Merge the first two segments back into one compound segment.
///
/// `["a", "b", "c"]` becomes `["a/b", "c"]`. Lists shorter than two
/// segments are returned unchanged.
pub fn fold_segments(segments: &[String]) -> Vec<String> {
    match segments {
        [first, second, rest @ ..] => {
            let mut folded = Vec::with_capacity(rest.len() + 1);
            folded.push(format!("{first}{FOLDER_DELIMITER}{second}"));
            folded.extend(rest.iter().cloned());
            folded
        }
        _ => segments.to_vec(),
    }
}

/// What to do with a folder at the current node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Nothing left to place
    Skip,
    /// Attach the folder as a new child of the current node with this name
    Attach(String),
    /// Move into the child at this position and continue with `rest`
    Descend { child: usize, rest: Vec<String> },
    /// Stay at the current node and try again with these segments
    Retry(Vec<String>),
}

/// Decide the next placement step.
///
/// `siblings` lists the current node's children as `(name, folder id)` in
/// insertion order; the first child whose name equals the leading segment
/// wins. `new_id` is the id of the folder being inserted.
pub fn plan_insert(
    segments: &[String],
    siblings: &[(&str, Option<&str>)],
    new_id: Option<&str>,
) -> Placement {
    let Some((part, rest)) = segments.split_first() else {
        return Placement::Skip;
    };
    let is_last = rest.is_empty();

    if let Some(child) = siblings.iter().position(|(name, _)| *name == part.as_str()) {
        let (_, child_id) = siblings[child];
        if is_last && child_id != new_id {
            // Same full path, different folder: keep both as siblings
            return Placement::Attach(part.clone());
        }
        return Placement::Descend {
            child,
            rest: rest.to_vec(),
        };
    }

    if is_last {
        Placement::Attach(part.clone())
    } else {
        Placement::Retry(fold_segments(segments))
    }
}
