use crate::gateway::{Blob, FsItem};
use crate::store::{Context, Op, StoreError};

const WRITE: Op = Op::new("fs/write/success", "fs/write/error", "Failed to write file");
const READ: Op = Op::new("fs/read/success", "fs/read/error", "Failed to read file");
const UPLOAD: Op = Op::new("fs/upload/success", "fs/upload/error", "Failed to upload files");
const DELETE: Op = Op::new("fs/delete/success", "fs/delete/error", "Failed to delete file");
const READ_DIR: Op = Op::new(
    "fs/readDir/success",
    "fs/readDir/error",
    "Failed to read directory",
);

/// Blob storage facade.
#[derive(Clone)]
pub struct Storage {
    ctx: Context,
}

impl Storage {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    pub async fn write(&self, path: &str, data: Blob) -> Result<Option<FsItem>, StoreError> {
        let gateway = self.ctx.gateway(WRITE.error)?;
        let result = gateway.fs().write(path, data).await;
        self.ctx.settle(WRITE, result)
    }

    pub async fn read(&self, path: &str) -> Result<Blob, StoreError> {
        let gateway = self.ctx.gateway(READ.error)?;
        let result = gateway.fs().read(path).await;
        self.ctx.settle(READ, result)
    }

    pub async fn upload(&self, files: Vec<Blob>) -> Result<FsItem, StoreError> {
        let gateway = self.ctx.gateway(UPLOAD.error)?;
        let result = gateway.fs().upload(files).await;
        self.ctx.settle(UPLOAD, result)
    }

    pub async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let gateway = self.ctx.gateway(DELETE.error)?;
        let result = gateway.fs().delete(path).await;
        self.ctx.settle(DELETE, result)
    }

    pub async fn read_dir(&self, path: &str) -> Result<Option<Vec<FsItem>>, StoreError> {
        let gateway = self.ctx.gateway(READ_DIR.error)?;
        let result = gateway.fs().readdir(path).await;
        self.ctx.settle(READ_DIR, result)
    }
}
