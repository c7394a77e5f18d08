use std::{
    fmt,
    path::{Path, PathBuf},
};

/// The short clips played on reminder state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Remind,
    Confirm,
    Cancel,
    Notification,
}

impl Sound {
    pub fn file_name(self) -> &'static str {
        match self {
            Sound::Remind => "remind.mp3",
            Sound::Confirm => "confirm.mp3",
            Sound::Cancel => "cancel.mp3",
            Sound::Notification => "notification.mp3",
        }
    }

    pub fn path(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_resolve_inside_sounds_dir() {
        let dir = Path::new("/srv/sounds");
        assert_eq!(
            Sound::Notification.path(dir),
            PathBuf::from("/srv/sounds/notification.mp3")
        );
        assert_eq!(Sound::Remind.path(Path::new(".")), PathBuf::from("./remind.mp3"));
    }
}
