//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from cx-core.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use futures::StreamExt;

use cx_core::{
    Error, ListOptions, ListPage, ObjectStore, ObjectStream, RemoteEntity, Result, S3Keys,
};

use crate::multipart::{MAX_PARTS, MultipartConfig, PartReader};

/// Classify an SDK failure by the service error code in its message
fn map_sdk_error<E>(err: E, resource: &str) -> Error
where
    E: std::error::Error,
{
    let message = DisplayErrorContext(err).to_string();
    if message.contains("NoSuchKey")
        || message.contains("NoSuchBucket")
        || message.contains("NotFound")
    {
        Error::NotFound(resource.to_string())
    } else if message.contains("InvalidAccessKeyId")
        || message.contains("SignatureDoesNotMatch")
        || message.contains("AccessDenied")
    {
        Error::Auth(message)
    } else {
        Error::Network(message)
    }
}

fn timestamp(value: Option<&aws_smithy_types::DateTime>) -> Option<jiff::Timestamp> {
    value.and_then(|t| jiff::Timestamp::from_second(t.secs()).ok())
}

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    multipart: MultipartConfig,
}

impl S3Client {
    /// Create a new S3 client from static keys
    pub async fn new(keys: &S3Keys, multipart: MultipartConfig) -> Result<Self> {
        let credentials = aws_credential_types::Credentials::new(
            keys.access_key.clone(),
            keys.secret_key.clone(),
            None, // session token
            None, // expiry
            "cx-static-credentials",
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(keys.region.clone()));
        if let Some(endpoint) = &keys.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        // Custom endpoints (MinIO and the like) generally need path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(keys.endpoint.is_some())
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            multipart,
        })
    }

    async fn put_single(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<u64> {
        let size = data.len() as u64;
        let mut request = self
            .inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(size as i64)
            .body(SdkByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        tracing::debug!(bucket, key, size, "put object");
        Ok(size)
    }

    async fn put_multipart(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        head: [Bytes; 2],
        reader: PartReader,
    ) -> Result<u64> {
        let resource = format!("{bucket}/{key}");
        let mut request = self.inner.create_multipart_upload().bucket(bucket).key(key);
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let created = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &resource))?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| Error::Network("S3 did not return a multipart upload id".into()))?
            .to_string();

        match self
            .upload_parts(bucket, key, &upload_id, head, reader)
            .await
        {
            Ok(total) => Ok(total),
            Err(e) => {
                if let Err(abort) = self
                    .inner
                    .abort_multipart_upload()
                    .bucket(bucket)
                    .key(key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        bucket,
                        key,
                        error = %DisplayErrorContext(abort),
                        "failed to abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        head: [Bytes; 2],
        mut reader: PartReader,
    ) -> Result<u64> {
        let resource = format!("{bucket}/{key}");
        let mut completed = Vec::new();
        let mut total = 0u64;
        let mut pending = head.into_iter();

        loop {
            let part = match pending.next() {
                Some(part) => part,
                None => match reader.next_part().await? {
                    Some(part) => part,
                    None => break,
                },
            };

            if completed.len() >= MAX_PARTS {
                return Err(Error::Transfer(format!(
                    "{resource} exceeds {MAX_PARTS} parts"
                )));
            }

            let part_number = completed.len() as i32 + 1;
            let size = part.len() as u64;
            let response = self
                .inner
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .content_length(size as i64)
                .body(SdkByteStream::from(part))
                .send()
                .await
                .map_err(|e| map_sdk_error(e, &resource))?;

            completed.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(response.e_tag().map(str::to_string))
                    .build(),
            );
            total += size;
            tracing::debug!(key, part_number, size, "uploaded part");
        }

        self.inner
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &resource))?;

        Ok(total)
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<RemoteEntity>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_sdk_error(e, "buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                RemoteEntity::bucket(b.name().unwrap_or_default())
                    .with_last_modified(timestamp(b.creation_date()))
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects_page(&self, bucket: &str, options: ListOptions) -> Result<ListPage> {
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if let Some(p) = &options.prefix {
            request = request.prefix(p);
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_sdk_error(e, bucket))?;

        let items = response
            .contents()
            .iter()
            .map(|object| {
                let size = object.size().unwrap_or(0).max(0) as u64;
                RemoteEntity::object(object.key().unwrap_or_default(), size)
                    .with_last_modified(timestamp(object.last_modified()))
            })
            .collect();

        Ok(ListPage {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn get_object_stream(&self, bucket: &str, key: &str) -> Result<ObjectStream> {
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, &format!("{bucket}/{key}")))?;

        let content_length = response.content_length().and_then(|l| u64::try_from(l).ok());
        let content_type = response.content_type().map(str::to_string);

        let body = futures::stream::try_unfold(response.body, |mut body| async move {
            let chunk = body
                .try_next()
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
            Ok::<_, Error>(chunk.map(|c| (c, body)))
        })
        .boxed();

        Ok(ObjectStream::new(body, content_length).with_content_type(content_type))
    }

    async fn put_object_stream(
        &self,
        bucket: &str,
        key: &str,
        stream: ObjectStream,
    ) -> Result<u64> {
        let part_size = self.multipart.part_size_for(stream.content_length) as usize;
        let content_type = stream.content_type;
        let mut reader = PartReader::new(stream.body, part_size);

        let first = reader.next_part().await?.unwrap_or_default();
        let Some(second) = reader.next_part().await? else {
            return self
                .put_single(bucket, key, first, content_type.as_deref())
                .await;
        };

        self.put_multipart(bucket, key, content_type.as_deref(), [first, second], reader)
            .await
    }
}
