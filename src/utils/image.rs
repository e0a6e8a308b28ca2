use image::GenericImageView;
use serde::{Deserialize, Serialize};

/// 图片格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    /// 从MIME类型获取图片格式
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// 获取文件扩展名
    pub fn to_extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    /// 扩展名别名（jpeg/jpg）
    pub fn matches_extension(&self, ext: &str) -> bool {
        match self {
            Self::Jpeg => ext == "jpg" || ext == "jpeg",
            _ => ext == self.to_extension(),
        }
    }

    fn as_image_crate_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

/// 图片尺寸
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// 图片元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub dimensions: ImageDimensions,
}

/// 通过文件头检测图片格式
pub fn detect_format(data: &[u8]) -> Result<ImageFormat, String> {
    if data.len() < 4 {
        return Err("Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string());
    }

    match &data[0..4] {
        [0xFF, 0xD8, 0xFF, _] => Ok(ImageFormat::Jpeg),
        [0x89, 0x50, 0x4E, 0x47] => Ok(ImageFormat::Png),
        [0x47, 0x49, 0x46, _] => Ok(ImageFormat::Gif),
        _ => {
            if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
                Ok(ImageFormat::Webp)
            } else {
                Err("Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string())
            }
        }
    }
}

/// 检测格式并完整解码，确认数据确实是一张图片
pub fn inspect_image(data: &[u8]) -> Result<ImageMetadata, String> {
    let format = detect_format(data)?;

    let decoded = image::load_from_memory_with_format(data, format.as_image_crate_format())
        .map_err(|_| {
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string()
        })?;

    Ok(ImageMetadata {
        format,
        dimensions: ImageDimensions {
            width: decoded.width(),
            height: decoded.height(),
        },
    })
}
