//! Transfer executor
//!
//! Streams one item from its source store to its destination store. Both
//! directions stream: memory is bounded by the transport chunk size on the
//! OneDrive upload side and by the multipart part size on the S3 side.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::path::ItemRef;
use crate::traits::{DriveStore, ObjectStore};

fn transfer_error(err: Error) -> Error {
    match err {
        Error::Transfer(_) => err,
        other => Error::Transfer(other.reason()),
    }
}

/// Moves bytes between an [`ObjectStore`] and a [`DriveStore`]
#[derive(Clone)]
pub struct TransferExecutor {
    objects: Arc<dyn ObjectStore>,
    drives: Arc<dyn DriveStore>,
}

impl TransferExecutor {
    pub fn new(objects: Arc<dyn ObjectStore>, drives: Arc<dyn DriveStore>) -> Self {
        Self { objects, drives }
    }

    /// Transfer `source` to `destination`, returning the bytes written
    ///
    /// Errors are reported as [`Error::Transfer`] and never retried.
    pub async fn transfer(&self, source: &ItemRef, destination: &ItemRef) -> Result<u64> {
        tracing::debug!(%source, %destination, "starting transfer");
        match (source, destination) {
            (
                ItemRef::S3 { bucket, key },
                ItemRef::OneDrive {
                    drive_id,
                    item_id: folder_id,
                    name,
                },
            ) => self
                .s3_to_onedrive(bucket, key, drive_id, folder_id, name)
                .await
                .map_err(transfer_error),
            (
                ItemRef::OneDrive {
                    drive_id,
                    item_id,
                    name,
                },
                ItemRef::S3 { bucket, key },
            ) => self
                .onedrive_to_s3(drive_id, item_id, name, bucket, key)
                .await
                .map_err(transfer_error),
            _ => Err(Error::Transfer(format!(
                "unsupported transfer {source} -> {destination}"
            ))),
        }
    }

    async fn s3_to_onedrive(
        &self,
        bucket: &str,
        key: &str,
        drive_id: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<u64> {
        let stream = self.objects.get_object_stream(bucket, key).await?;
        let expected = stream.content_length;

        let uploaded = self.drives.upload(drive_id, folder_id, name, stream).await?;
        Ok(uploaded.size_bytes.or(expected).unwrap_or(0))
    }

    async fn onedrive_to_s3(
        &self,
        drive_id: &str,
        item_id: &str,
        name: &str,
        bucket: &str,
        key: &str,
    ) -> Result<u64> {
        let mut stream = self.drives.download(drive_id, item_id).await?;
        if stream.content_type.is_none() {
            stream.content_type = mime_guess::from_path(name)
                .first()
                .map(|m| m.essence_str().to_string());
        }

        self.objects.put_object_stream(bucket, key, stream).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory stores shared by executor and orchestrator tests

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{Error, Result};
    use crate::traits::{DriveStore, ListOptions, ListPage, ObjectStore, ObjectStream, RemoteEntity};

    #[derive(Default)]
    pub struct MemoryObjectStore {
        pub objects: Mutex<HashMap<(String, String), Vec<u8>>>,
        pub puts: Mutex<Vec<(String, String, Option<String>)>>,
        pub gets: Mutex<usize>,
    }

    impl MemoryObjectStore {
        pub fn with_object(self, bucket: &str, key: &str, data: &[u8]) -> Self {
            self.objects
                .lock()
                .unwrap()
                .insert((bucket.to_string(), key.to_string()), data.to_vec());
            self
        }

        pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryObjectStore {
        async fn list_buckets(&self) -> Result<Vec<RemoteEntity>> {
            Ok(vec![])
        }

        async fn list_objects_page(
            &self,
            _bucket: &str,
            _options: ListOptions,
        ) -> Result<ListPage> {
            Ok(ListPage::default())
        }

        async fn get_object_stream(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
            *self.gets.lock().unwrap() += 1;
            self.get(bucket, key)
                .map(ObjectStream::from_bytes)
                .ok_or_else(|| Error::NotFound(format!("{bucket}/{key}")))
        }

        async fn put_object_stream(
            &self,
            bucket: &str,
            key: &str,
            stream: ObjectStream,
        ) -> Result<u64> {
            let content_type = stream.content_type.clone();
            let data = stream.collect().await?;
            let len = data.len() as u64;
            self.objects
                .lock()
                .unwrap()
                .insert((bucket.to_string(), key.to_string()), data);
            self.puts
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string(), content_type));
            Ok(len)
        }
    }

    #[derive(Default)]
    pub struct MemoryDriveStore {
        /// (drive, item id) -> (name, content)
        pub items: Mutex<HashMap<(String, String), (String, Vec<u8>)>>,
        /// (drive, folder, name) -> content
        pub uploads: Mutex<Vec<(String, String, String, Vec<u8>)>>,
        /// Names whose upload is rejected
        pub reject: Vec<String>,
    }

    impl MemoryDriveStore {
        pub fn with_item(self, drive: &str, id: &str, name: &str, data: &[u8]) -> Self {
            self.items.lock().unwrap().insert(
                (drive.to_string(), id.to_string()),
                (name.to_string(), data.to_vec()),
            );
            self
        }

        pub fn rejecting(mut self, name: &str) -> Self {
            self.reject.push(name.to_string());
            self
        }

        pub fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DriveStore for MemoryDriveStore {
        async fn list_root_children(&self) -> Result<Vec<RemoteEntity>> {
            Ok(vec![])
        }

        async fn list_drives(&self) -> Result<Vec<RemoteEntity>> {
            Ok(vec![])
        }

        async fn list_children(
            &self,
            _drive_id: &str,
            _folder_id: &str,
        ) -> Result<Vec<RemoteEntity>> {
            Ok(vec![])
        }

        async fn download(&self, drive_id: &str, item_id: &str) -> Result<ObjectStream> {
            self.items
                .lock()
                .unwrap()
                .get(&(drive_id.to_string(), item_id.to_string()))
                .map(|(_, data)| ObjectStream::from_bytes(data.clone()))
                .ok_or_else(|| Error::NotFound(format!("{drive_id}/{item_id}")))
        }

        async fn upload(
            &self,
            drive_id: &str,
            folder_id: &str,
            name: &str,
            stream: ObjectStream,
        ) -> Result<RemoteEntity> {
            if self.reject.iter().any(|r| r == name) {
                return Err(Error::Network(format!("403 Forbidden: {name}")));
            }
            let data = stream.collect().await?;
            let len = data.len() as u64;
            self.uploads.lock().unwrap().push((
                drive_id.to_string(),
                folder_id.to_string(),
                name.to_string(),
                data,
            ));
            Ok(RemoteEntity::file(format!("new-{name}"), name, len))
        }
    }
}
