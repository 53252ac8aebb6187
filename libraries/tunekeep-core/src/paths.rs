//! Lexical path helpers
//!
//! Nothing here touches the filesystem, so paths to files that do not exist
//! yet (move destinations, playlist entries of deleted tracks) behave the same
//! as existing ones.

use std::path::{Component, Path, PathBuf};

/// Remove `.` segments and fold `..` into the preceding component
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Forward-slash path from `root` to `target`, with `..` where needed
///
/// Returns `None` when the two paths share no common base (relative vs
/// absolute, or different drive prefixes).
pub fn relative_entry(root: &Path, target: &Path) -> Option<String> {
    let root = normalize(root);
    let target = normalize(target);

    if root.is_absolute() != target.is_absolute() {
        return None;
    }

    let root_parts: Vec<Component<'_>> = root.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let common = root_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 && root.is_absolute() {
        return None;
    }

    let mut segments: Vec<String> = Vec::new();
    for part in &root_parts[common..] {
        if matches!(part, Component::Normal(_)) {
            segments.push("..".to_string());
        }
    }
    for part in &target_parts[common..] {
        match part {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::ParentDir => segments.push("..".to_string()),
            _ => return None,
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }

    #[test]
    fn test_relative_inside_root() {
        assert_eq!(
            relative_entry(Path::new("/m/P"), Path::new("/m/P/AllSongs/x.mp3")).as_deref(),
            Some("AllSongs/x.mp3")
        );
    }

    #[test]
    fn test_relative_outside_root() {
        assert_eq!(
            relative_entry(Path::new("/m/P"), Path::new("/m/Temp/x.mp3")).as_deref(),
            Some("../Temp/x.mp3")
        );
        assert_eq!(
            relative_entry(Path::new("/m/P/deep"), Path::new("/other/x.mp3")).as_deref(),
            Some("../../../other/x.mp3")
        );
    }

    #[test]
    fn test_relative_mismatched_kinds() {
        assert_eq!(relative_entry(Path::new("/m/P"), Path::new("x.mp3")), None);
        assert_eq!(relative_entry(Path::new("/m/P"), Path::new("/m/P")), None);
    }
}
