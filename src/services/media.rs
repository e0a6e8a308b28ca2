use crate::{
    config::Config,
    error::{AppError, Result},
    models::post::ImageUpload,
    utils::{
        image::{inspect_image, ImageFormat},
        validation::single_error,
    },
};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// 上传图片的存储，文件保存在 MEDIA_ROOT 下
#[derive(Clone)]
pub struct MediaService {
    config: Config,
}

impl MediaService {
    pub async fn new(config: &Config) -> Result<Self> {
        tokio::fs::create_dir_all(Path::new(&config.media_root).join("posts")).await?;

        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn media_root(&self) -> &Path {
        Path::new(&self.config.media_root)
    }

    /// 校验并保存帖子图片，返回相对 MEDIA_ROOT 的路径
    pub async fn save_post_image(&self, upload: &ImageUpload) -> Result<String> {
        debug!(
            "Saving image upload {} ({} bytes)",
            upload.file_name,
            upload.data.len()
        );

        if upload.data.len() > self.config.max_upload_size {
            return Err(AppError::ValidatorError(single_error(
                "image",
                "file_too_large",
                "The uploaded file is too large.",
            )));
        }

        let metadata = inspect_image(&upload.data).map_err(|_| {
            AppError::ValidatorError(single_error("image", "invalid_image", INVALID_IMAGE))
        })?;

        // 声明的类型与实际内容不符时拒绝
        let declared = upload
            .content_type
            .as_deref()
            .and_then(ImageFormat::from_mime_type);
        if declared.map_or(false, |format| format != metadata.format) {
            return Err(AppError::ValidatorError(single_error(
                "image",
                "invalid_image",
                INVALID_IMAGE,
            )));
        }

        let allowed = self.config.allowed_image_extensions();
        if !allowed.iter().any(|ext| metadata.format.matches_extension(ext)) {
            return Err(AppError::ValidatorError(single_error(
                "image",
                "invalid_extension",
                "File extension is not allowed.",
            )));
        }

        let relative = format!(
            "posts/{}.{}",
            Uuid::new_v4().simple(),
            metadata.format.to_extension()
        );
        let target = self.media_root().join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &upload.data).await?;

        info!(
            "Stored image {} ({}x{})",
            relative, metadata.dimensions.width, metadata.dimensions.height
        );
        Ok(relative)
    }

    /// 删除已保存的文件。文件不存在时忽略
    pub async fn delete_file(&self, relative: &str) -> Result<()> {
        let Some(path) = self.resolve(relative) else {
            warn!("Refusing to delete path outside media root: {}", relative);
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted media file {}", relative);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// 将相对路径解析到 MEDIA_ROOT 内部
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        let inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        inside.then(|| self.media_root().join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageOutputFormat::Png).unwrap();
        bytes.into_inner()
    }

    async fn service() -> MediaService {
        let root = std::env::temp_dir().join(format!("yatube-media-{}", Uuid::new_v4().simple()));
        MediaService::new(&Config {
            media_root: root.to_string_lossy().into_owned(),
            ..Config::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_delete_image() {
        let media = service().await;
        let upload = ImageUpload {
            file_name: "small.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from(tiny_png()),
        };

        let relative = media.save_post_image(&upload).await.unwrap();
        assert!(relative.starts_with("posts/"));
        assert!(relative.ends_with(".png"));
        assert!(media.media_root().join(&relative).exists());

        media.delete_file(&relative).await.unwrap();
        assert!(!media.media_root().join(&relative).exists());
        media.delete_file(&relative).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_non_image() {
        let media = service().await;
        let upload = ImageUpload {
            file_name: "notes.png".to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(b"definitely not an image"),
        };

        match media.save_post_image(&upload).await {
            Err(AppError::ValidatorError(errors)) => {
                assert!(errors.field_errors().contains_key("image"));
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_rejects_mismatched_content_type() {
        let media = service().await;
        let upload = ImageUpload {
            file_name: "photo.gif".to_string(),
            content_type: Some("image/gif".to_string()),
            data: Bytes::from(tiny_png()),
        };

        assert!(matches!(
            media.save_post_image(&upload).await,
            Err(AppError::ValidatorError(_))
        ));

        // 通用的二进制类型不参与比对
        let upload = ImageUpload {
            content_type: Some("application/octet-stream".to_string()),
            ..upload
        };
        assert!(media.save_post_image(&upload).await.is_ok());
    }

    #[test]
    fn test_resolve_stays_inside_root() {
        let media = MediaService {
            config: Config::default(),
        };
        assert!(media.resolve("posts/a.png").is_some());
        assert!(media.resolve("../etc/passwd").is_none());
        assert!(media.resolve("/etc/passwd").is_none());
    }
}
