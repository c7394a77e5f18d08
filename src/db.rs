use crate::error::Error;
use ahash::AHasher;
use chrono_tz::Tz;
use serenity::all::UserId;
use std::{collections::HashMap, hash::BuildHasherDefault, io::SeekFrom, path::Path};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};

/// Per-user timezones, kept as a JSON object of user ID to IANA name
pub struct Db {
    file: File,
    data: HashMap<u64, Tz, BuildHasherDefault<AHasher>>,
}

impl Db {
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, Error> {
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .write(true)
            .truncate(false)
            .open(db_path.as_ref())
            .await?;

        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        // A fresh or unreadable store starts out empty
        let data = serde_json::from_str(&contents).unwrap_or_else(|why| {
            if !contents.trim().is_empty() {
                log::warn!(
                    "Discarding unparsable timezone store {}: {}",
                    db_path.as_ref().display(),
                    why
                );
            }
            HashMap::default()
        });

        Ok(Self { file, data })
    }

    async fn persist(&mut self) -> Result<(), Error> {
        let contents = serde_json::to_string(&self.data)?;

        self.file.set_len(0).await?;
        self.file.seek(SeekFrom::Start(0)).await?;
        self.file.write_all(contents.as_bytes()).await?;
        self.file.flush().await?;

        Ok(())
    }

    pub fn tz(&self, user: UserId) -> Option<Tz> {
        self.data.get(&user.get()).copied()
    }

    pub async fn set_tz(&mut self, user: UserId, tz_str: &str) -> Result<Tz, Error> {
        let tz = tz_str
            .trim()
            .parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(tz_str.trim().to_string()))?;

        self.data.insert(user.get(), tz);
        self.persist().await?;

        Ok(tz)
    }

    pub async fn remove(&mut self, user: UserId) -> Result<Option<Tz>, Error> {
        let removed = self.data.remove(&user.get());
        if removed.is_some() {
            self.persist().await?;
        }

        Ok(removed)
    }
}
