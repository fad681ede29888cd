use std::path::{Component, Path, PathBuf};

pub trait PathExt: AsRef<Path> {
    /// The path with its final extension (if any) removed.
    fn without_extension(&self) -> PathBuf;

    /// The path as a string with `/` separators, regardless of platform.
    fn to_posix(&self) -> String;

    /// Resolves `.` and `..` components without touching the file system.
    /// `..` never climbs above a root; leading `..`s of a relative path are
    /// kept.
    fn normalize(&self) -> PathBuf;
}

impl PathExt for Path {
    fn without_extension(&self) -> PathBuf {
        match self.extension() {
            Some(_) => self.with_extension(""),
            None => self.to_path_buf(),
        }
    }

    fn to_posix(&self) -> String {
        self.components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn normalize(&self) -> PathBuf {
        let mut normal = PathBuf::new();
        for component in self.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => match normal.components().next_back() {
                    Some(Component::Normal(_)) => { normal.pop(); }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    None | Some(_) => normal.push(".."),
                },
                other => normal.push(other.as_os_str()),
            }
        }

        normal
    }
}
