//! Module identifiers from file paths.

use crate::domain::errors::NormalizeError;
use crate::domain::model::ModuleIdentifier;

/// Compute the module identifier for `path`.
///
/// With a root, the identifier starts right after its first occurrence in `path`; without one it
/// starts after the first `/`. It ends before the last `.` of the remainder, so
/// `temp/amd/lib/provider/LibName.ts` with root `temp/amd/` becomes `lib/provider/LibName`.
///
/// The result is not validated: it may be empty or contain characters that are not legal in a
/// module name.
pub fn normalize(path: &str, root: Option<&str>) -> Result<ModuleIdentifier, NormalizeError> {
    let start = match root.filter(|root| !root.is_empty()) {
        Some(root) => {
            path.find(root)
                .ok_or_else(|| NormalizeError::RootNotFound {
                    path: path.to_owned(),
                    root: root.to_owned(),
                })?
                + root.len()
        }
        None => path.find('/').map_or(0, |slash| slash + 1),
    };

    let rest = &path[start..];
    let end = rest.rfind('.').unwrap_or(rest.len());
    Ok(ModuleIdentifier::new(&rest[..end]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str, root: Option<&str>) -> String {
        normalize(path, root).unwrap().as_str().to_owned()
    }

    #[test]
    fn strips_root_and_extension() {
        assert_eq!(
            id("temp/subfolder/lib/provider/LibName.ts", Some("temp/subfolder/")),
            "lib/provider/LibName"
        );
        assert_eq!(id("root/pkg/Mod.js", Some("root/")), "pkg/Mod");
    }

    #[test]
    fn root_matches_first_occurrence_anywhere_in_path() {
        assert_eq!(id("./amd/common/amd/View.js", Some("amd/")), "common/amd/View");
    }

    #[test]
    fn without_root_strips_through_first_slash() {
        assert_eq!(id("amd/common/Page.js", None), "common/Page");
        assert_eq!(id("amd/common/Page.js", Some("")), "common/Page");
    }

    #[test]
    fn without_slash_starts_at_beginning() {
        assert_eq!(id("Main.js", None), "Main");
    }

    #[test]
    fn without_extension_runs_to_end() {
        assert_eq!(id("amd/common/LICENSE", None), "common/LICENSE");
    }

    #[test]
    fn only_the_last_dot_is_stripped() {
        assert_eq!(id("amd/vendor/jquery.min.js", Some("amd/")), "vendor/jquery.min");
    }

    #[test]
    fn dots_before_the_root_are_ignored() {
        assert_eq!(id("v1.2/amd/Module", Some("amd/")), "Module");
    }

    #[test]
    fn result_may_be_empty() {
        assert_eq!(id("amd/.js", Some("amd/")), "");
    }

    #[test]
    fn missing_root_is_rejected() {
        let err = normalize("lib/Module.js", Some("amd/")).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::RootNotFound {
                path: "lib/Module.js".into(),
                root: "amd/".into(),
            }
        );
    }
}
