use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::gateway::{Blob, FsApi, FsItem};

/// S3 / MinIO blob storage. Gateway paths map one-to-one onto object keys.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    async fn put(&self, key: &str, blob: &Blob) -> Result<FsItem> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(&blob.content_type)
            .body(ByteStream::from(blob.data.clone()))
            .send()
            .await
            .map_err(|e| anyhow!("S3 upload failed: {e}"))?;

        info!("Stored s3://{}/{} ({} bytes)", self.bucket, key, blob.len());
        let now = Utc::now();
        Ok(FsItem {
            name: file_name(key).to_string(),
            path: path_for(key),
            is_dir: false,
            size: Some(blob.len() as u64),
            created: Some(now),
            modified: Some(now),
        })
    }
}

fn key_for(path: &str) -> &str {
    path.trim_start_matches('/')
}

fn path_for(key: &str) -> String {
    format!("/{}", key.trim_start_matches('/'))
}

fn file_name(key: &str) -> &str {
    key.trim_end_matches('/').rsplit('/').next().unwrap_or(key)
}

/// Replaces anything that is not safe in an object key segment.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn upload_key(blob: &Blob) -> String {
    let name = blob.name.as_deref().map(sanitize).unwrap_or_else(|| "upload".to_string());
    format!("uploads/{}-{}", Uuid::new_v4(), name)
}

fn directory_prefix(path: &str) -> String {
    let key = key_for(path).trim_end_matches('/');
    if key.is_empty() {
        String::new()
    } else {
        format!("{key}/")
    }
}

fn to_chrono(ts: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

/// Maps one listing page to entries: common prefixes as directories, then objects.
fn page_items(page: &ListObjectsV2Output) -> Vec<FsItem> {
    let dirs = page
        .common_prefixes()
        .iter()
        .filter_map(|p| p.prefix())
        .map(|p| FsItem {
            name: file_name(p).to_string(),
            path: path_for(p.trim_end_matches('/')),
            is_dir: true,
            size: None,
            created: None,
            modified: None,
        });

    let files = page.contents().iter().filter_map(|object| {
        let key = object.key()?;
        let modified = object.last_modified().and_then(to_chrono);
        Some(FsItem {
            name: file_name(key).to_string(),
            path: path_for(key),
            is_dir: false,
            size: object.size().map(|s| s.max(0) as u64),
            created: modified,
            modified,
        })
    });

    dirs.chain(files).collect()
}

#[async_trait]
impl FsApi for S3Storage {
    async fn write(&self, path: &str, data: Blob) -> Result<Option<FsItem>> {
        let key = key_for(path);
        if key.is_empty() {
            bail!("Cannot write to the storage root");
        }
        self.put(key, &data).await.map(Some)
    }

    async fn read(&self, path: &str) -> Result<Blob> {
        let key = key_for(path);
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow!("S3 download failed for {path}: {e}"))?;

        let content_type = output
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| anyhow!("S3 body read failed for {path}: {e}"))?
            .into_bytes();

        Ok(Blob {
            name: Some(file_name(key).to_string()),
            content_type,
            data,
        })
    }

    async fn upload(&self, files: Vec<Blob>) -> Result<FsItem> {
        let mut last = None;
        for blob in &files {
            let key = upload_key(blob);
            last = Some(self.put(&key, blob).await?);
        }
        last.ok_or_else(|| anyhow!("No files to upload"))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key_for(path))
            .send()
            .await
            .map_err(|e| anyhow!("S3 delete failed for {path}: {e}"))?;
        Ok(())
    }

    async fn readdir(&self, path: &str) -> Result<Option<Vec<FsItem>>> {
        let prefix = directory_prefix(path);
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .delimiter("/")
            .into_paginator()
            .send();

        let mut items: Vec<FsItem> = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| anyhow!("S3 list failed for {path}: {e}"))?;
            items.extend(page_items(&page));
        }

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(items))
        }
    }
}
