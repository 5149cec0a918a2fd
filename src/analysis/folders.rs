use std::collections::HashMap;

use crate::types::{TreeEntry, TreeKind};

/// Path of `entry` relative to `current_path`, if it lies inside it.
fn relative<'a>(path: &'a str, current_path: &str) -> Option<&'a str> {
    if current_path.is_empty() {
        return Some(path);
    }
    path.strip_prefix(current_path)?.strip_prefix('/')
}

/// Sums blob sizes per direct child folder of `current_path`.
///
/// Only blobs at least one level below a child folder count, so a file
/// sitting directly in `current_path` never shows up as a folder.
pub fn folder_sizes<'a, I>(entries: I, current_path: &str) -> HashMap<String, u64>
where
    I: IntoIterator<Item = &'a TreeEntry>,
{
    let current_path = current_path.trim_matches('/');
    let mut sizes: HashMap<String, u64> = HashMap::new();

    for entry in entries {
        if entry.kind != TreeKind::Blob {
            continue;
        }
        let Some(rest) = relative(&entry.path, current_path) else {
            continue;
        };
        if let Some((dir, _)) = rest.split_once('/') {
            *sizes.entry(dir.to_string()).or_default() += entry.size.unwrap_or(0);
        }
    }

    sizes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str, size: u64) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: TreeKind::Blob,
            size: Some(size),
        }
    }

    fn tree(path: &str) -> TreeEntry {
        TreeEntry {
            path: path.to_string(),
            kind: TreeKind::Tree,
            size: None,
        }
    }

    #[test]
    fn sums_by_first_segment_at_root() {
        let entries = vec![blob("a/x.txt", 10), blob("a/y.txt", 20), blob("b/z.txt", 5)];
        let sizes = folder_sizes(&entries, "");
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes["a"], 30);
        assert_eq!(sizes["b"], 5);
    }

    #[test]
    fn counts_deep_blobs_and_skips_top_level_files() {
        let entries = vec![
            tree("src"),
            tree("src/bin"),
            blob("README.md", 1000),
            blob("src/lib.rs", 7),
            blob("src/bin/main.rs", 3),
        ];
        let sizes = folder_sizes(&entries, "");
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes["src"], 10);
    }

    #[test]
    fn matches_paths_decoded_from_a_permalink() {
        use crate::analysis::RepoContext;

        let ctx = RepoContext::from_permalink("https://github.com/o/n/tree/main/my%20dir").unwrap();
        let entries = vec![blob("my dir/sub/x.txt", 4), blob("my dir/sub/y.txt", 6)];
        let sizes = folder_sizes(&entries, &ctx.path);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes["sub"], 10);
    }

    #[test]
    fn stays_inside_current_path() {
        let entries = vec![
            blob("src/a/one.rs", 1),
            blob("src/a/deep/two.rs", 2),
            blob("src/top.rs", 50),
            blob("src2/b/three.rs", 100),
            blob("other/src/c/four.rs", 1000),
        ];
        let sizes = folder_sizes(&entries, "src/");
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes["a"], 3);
    }
}
