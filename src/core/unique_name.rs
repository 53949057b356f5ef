/*
 * This module provides collision-free naming for new directory entries.
 * Create, move, rename and copy all route candidate names through here so
 * that an existing sibling is never overwritten; the incoming entry is the
 * one that gets renamed, by appending a numeric "(n)" suffix. For file names
 * the suffix is inserted before the extension.
 *
 * The existence probe and the subsequent create are separate steps with no
 * lock between them, so the result is best-effort under concurrent writers.
 */

/*
 * Splits a file name into (base, extension) following `std::path` semantics:
 * "report.txt" -> ("report", Some("txt")), ".gitignore" -> (".gitignore",
 * None), "archive.tar.gz" -> ("archive.tar", Some("gz")).
 */
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    let path = std::path::Path::new(name);
    let extension = path.extension().and_then(|e| e.to_str());
    let base = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    (base, extension)
}

/*
 * Produces a file name that does not collide with any existing sibling.
 * Probes "name", then "base(1).ext", "base(2).ext", ... until the predicate
 * reports the name free.
 */
pub fn unique_file_name<F>(candidate: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !exists(candidate) {
        return candidate.to_string();
    }
    let (base, extension) = split_extension(candidate);
    let mut counter: u32 = 1;
    loop {
        let probe = match extension {
            Some(ext) => format!("{base}({counter}).{ext}"),
            None => format!("{base}({counter})"),
        };
        if !exists(&probe) {
            log::debug!("UniqueName: '{candidate}' collides; using '{probe}'.");
            return probe;
        }
        counter += 1;
    }
}

/*
 * Folder variant: no extension split, the suffix is appended to the whole
 * name ("assets", "assets(1)", "assets(2)", ...).
 */
pub fn unique_folder_name<F>(candidate: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !exists(candidate) {
        return candidate.to_string();
    }
    let mut counter: u32 = 1;
    loop {
        let probe = format!("{candidate}({counter})");
        if !exists(&probe) {
            log::debug!("UniqueName: '{candidate}' collides; using '{probe}'.");
            return probe;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_free_name_is_returned_unchanged() {
        let existing = taken(&["other.txt"]);
        assert_eq!(
            unique_file_name("report.txt", |n| existing.contains(n)),
            "report.txt"
        );
    }

    #[test]
    fn test_suffix_inserted_before_extension() {
        let existing = taken(&["report.txt"]);
        assert_eq!(
            unique_file_name("report.txt", |n| existing.contains(n)),
            "report(1).txt"
        );
    }

    #[test]
    fn test_counter_increments_past_taken_suffixes() {
        let existing = taken(&["report.txt", "report(1).txt", "report(2).txt"]);
        assert_eq!(
            unique_file_name("report.txt", |n| existing.contains(n)),
            "report(3).txt"
        );
    }

    #[test]
    fn test_file_without_extension() {
        let existing = taken(&["Makefile"]);
        assert_eq!(
            unique_file_name("Makefile", |n| existing.contains(n)),
            "Makefile(1)"
        );
    }

    #[test]
    fn test_multi_dot_name_keeps_inner_dots() {
        let existing = taken(&["archive.tar.gz"]);
        assert_eq!(
            unique_file_name("archive.tar.gz", |n| existing.contains(n)),
            "archive.tar(1).gz"
        );
    }

    #[test]
    fn test_folder_name_gets_plain_suffix() {
        let existing = taken(&["assets", "assets(1)"]);
        assert_eq!(
            unique_folder_name("assets", |n| existing.contains(n)),
            "assets(2)"
        );
    }

    #[test]
    fn test_split_extension_edge_cases() {
        assert_eq!(split_extension("report.txt"), ("report", Some("txt")));
        assert_eq!(split_extension(".gitignore"), (".gitignore", None));
        assert_eq!(split_extension("noext"), ("noext", None));
        assert_eq!(
            split_extension("archive.tar.gz"),
            ("archive.tar", Some("gz"))
        );
    }
}
