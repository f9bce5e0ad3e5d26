use crate::refs::{ObjectReferences, RefType};
use crate::Result;
use image::{ColorType, DynamicImage};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use std::path::{Path, PathBuf};

pub enum RasterImageType {
    /// An RGB JPEG file, embedded byte for byte
    DirectlyEmbeddableJpeg(PathBuf),
    Image(DynamicImage),
}

/// A page image. Its size in pixels is the size of the page in points.
pub struct Image {
    pub image: RasterImageType,
    pub width: f32,
    pub height: f32,
}

struct EncodeOutput {
    filter: Filter,
    bytes: Vec<u8>,
    mask: Option<Vec<u8>>,
}

impl Image {
    /// Load an image from disk, keeping RGB JPEGs in their original encoding
    pub fn new_from_disk<P: AsRef<Path>>(path: P) -> Result<Image> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;

        let format = image::guess_format(&data)?;
        let image = image::load_from_memory_with_format(&data, format)?;

        match (format, image.color()) {
            (image::ImageFormat::Jpeg, ColorType::Rgb8) => {
                // we can embed it directly!
                let width = image.width() as f32;
                let height = image.height() as f32;

                Ok(Image {
                    image: RasterImageType::DirectlyEmbeddableJpeg(path.to_owned()),
                    width,
                    height,
                })
            }
            _ => Self::new_raster(image),
        }
    }

    pub fn new_raster(image: DynamicImage) -> Result<Image> {
        let width = image.width() as f32;
        let height = image.height() as f32;
        Ok(Image {
            image: RasterImageType::Image(image),
            width,
            height,
        })
    }

    /// The size of an image file in pixels, read from its header without decoding it.
    /// The format is sniffed from the contents, not the extension.
    pub fn dimensions<P: AsRef<Path>>(path: P) -> Result<(u32, u32)> {
        let reader = image::io::Reader::open(path)?.with_guessed_format()?;
        Ok(reader.into_dimensions()?)
    }

    fn encode_raster(&self) -> Result<EncodeOutput> {
        match &self.image {
            RasterImageType::DirectlyEmbeddableJpeg(path) => {
                let bytes = std::fs::read(path)?;
                Ok(EncodeOutput {
                    filter: Filter::DctDecode,
                    bytes,
                    mask: None,
                })
            }
            RasterImageType::Image(image) => {
                use image::GenericImageView;
                let level = CompressionLevel::DefaultLevel as u8;

                let mask = image.color().has_alpha().then(|| {
                    let alphas: Vec<_> = image.pixels().map(|p| (p.2).0[3]).collect();
                    compress_to_vec_zlib(&alphas, level)
                });

                let bytes = compress_to_vec_zlib(image.to_rgb8().as_raw(), level);

                Ok(EncodeOutput {
                    filter: Filter::FlateDecode,
                    bytes,
                    mask,
                })
            }
        }
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        image_index: usize,
        writer: &mut Pdf,
    ) -> Result<()> {
        let id = refs.gen(RefType::Image(image_index));
        let encoded = self.encode_raster()?;

        let mask_id = encoded
            .mask
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));

        let mut image = writer.image_xobject(id, encoded.bytes.as_slice());
        image.filter(encoded.filter);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        // add a transparency mask if we have one
        if let (Some(mask_id), Some(mask)) = (mask_id, encoded.mask.as_ref()) {
            let mut s_mask = writer.image_xobject(mask_id, mask.as_slice());
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_images_keep_their_pixel_size() {
        let image = Image::new_raster(DynamicImage::new_rgba8(12, 7)).unwrap();
        assert_eq!((image.width, image.height), (12.0, 7.0));

        let encoded = image.encode_raster().unwrap();
        assert!(encoded.mask.is_some());
        assert!(matches!(encoded.filter, Filter::FlateDecode));
    }

    #[test]
    fn opaque_images_have_no_mask() {
        let image = Image::new_raster(DynamicImage::new_rgb8(3, 3)).unwrap();
        assert!(image.encode_raster().unwrap().mask.is_none());
    }

    #[test]
    fn reads_dimensions_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        DynamicImage::new_rgb8(20, 10).save(&path).unwrap();

        assert_eq!(Image::dimensions(&path).unwrap(), (20, 10));
        let loaded = Image::new_from_disk(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (20.0, 10.0));
    }

    #[test]
    fn formats_are_sniffed_not_taken_from_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.scan");
        DynamicImage::new_rgb8(6, 4)
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        assert_eq!(Image::dimensions(&path).unwrap(), (6, 4));
        assert!(Image::new_from_disk(&path).is_ok());
    }

    #[test]
    fn unreadable_images_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(Image::new_from_disk(&path).is_err());
    }
}
