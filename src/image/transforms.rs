use crate::utils::error::DetectError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array2;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 短边缩放到 `size`，保持宽高比（长边向下取整）
    pub fn resize_shorter_side(image: &DynamicImage, size: u32) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_w, new_h) = if width <= height {
            (size, (size as u64 * height as u64 / width as u64) as u32)
        } else {
            ((size as u64 * width as u64 / height as u64) as u32, size)
        };

        if (new_w, new_h) == (width, height) {
            return image.clone();
        }

        image.resize_exact(new_w, new_h, FilterType::Triangle)
    }

    /// 中心裁剪为 `size` x `size`
    pub fn center_crop(image: &DynamicImage, size: u32) -> Result<DynamicImage> {
        let (width, height) = image.dimensions();
        if width < size || height < size {
            return Err(DetectError::ImageProcessing(format!(
                "Cannot center-crop {}x{} image to {}x{}",
                width, height, size, size
            )));
        }

        let left = ((width - size) as f32 / 2.0).round() as u32;
        let top = ((height - size) as f32 / 2.0).round() as u32;

        Ok(image.crop_imm(left, top, size, size))
    }

    /// 灰度化（ITU-R 601-2 亮度，16位定点，与 PIL `convert("L")` 一致），返回 HW 数组，取值 0-255
    pub fn to_grayscale(image: &DynamicImage) -> Array2<f32> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();

        let mut gray = Array2::<f32>::zeros((height as usize, width as usize));
        for (x, y, pixel) in rgb_image.enumerate_pixels() {
            let [r, g, b] = pixel.0.map(u32::from);
            let luma = (r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16;
            gray[[y as usize, x as usize]] = luma as f32;
        }

        gray
    }

    /// 水平翻转
    pub fn flip_horizontal(image: &Array2<f32>) -> Array2<f32> {
        let (height, width) = image.dim();
        let mut flipped = Array2::<f32>::zeros((height, width));

        for h in 0..height {
            for w in 0..width {
                flipped[[h, width - 1 - w]] = image[[h, w]];
            }
        }

        flipped
    }

    /// 绕中心旋转（正角度为逆时针），最近邻采样，越界填0
    pub fn rotate(image: &Array2<f32>, angle_degrees: f32) -> Array2<f32> {
        if angle_degrees.abs() < f32::EPSILON {
            return image.clone();
        }

        let (height, width) = image.dim();
        let (sin, cos) = (angle_degrees as f64).to_radians().sin_cos();
        let cx = (width as f64 - 1.0) / 2.0;
        let cy = (height as f64 - 1.0) / 2.0;

        let mut rotated = Array2::<f32>::zeros((height, width));

        // 逆映射：输出像素反转角度后落到源图的位置
        for h in 0..height {
            for w in 0..width {
                let dx = w as f64 - cx;
                let dy = h as f64 - cy;
                let src_x = (cos * dx - sin * dy + cx).round();
                let src_y = (sin * dx + cos * dy + cy).round();

                if src_x >= 0.0 && src_y >= 0.0 && (src_x as usize) < width && (src_y as usize) < height {
                    rotated[[h, w]] = image[[src_y as usize, src_x as usize]];
                }
            }
        }

        rotated
    }

    /// 平移 (dx 向右, dy 向下)，越界填0
    pub fn translate(image: &Array2<f32>, dx: i64, dy: i64) -> Array2<f32> {
        if dx == 0 && dy == 0 {
            return image.clone();
        }

        let (height, width) = image.dim();
        let mut shifted = Array2::<f32>::zeros((height, width));

        for h in 0..height {
            for w in 0..width {
                let src_y = h as i64 - dy;
                let src_x = w as i64 - dx;
                if src_y >= 0 && src_x >= 0 && (src_y as usize) < height && (src_x as usize) < width {
                    shifted[[h, w]] = image[[src_y as usize, src_x as usize]];
                }
            }
        }

        shifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use ndarray::array;

    #[test]
    fn resize_keeps_aspect_ratio() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(400, 300));
        let resized = ImageTransforms::resize_shorter_side(&image, 256);
        assert_eq!(resized.dimensions(), (341, 256));

        let tall = DynamicImage::ImageRgb8(RgbImage::new(300, 1000));
        assert_eq!(ImageTransforms::resize_shorter_side(&tall, 256).dimensions(), (256, 853));
    }

    #[test]
    fn center_crop_takes_the_middle() {
        let mut img = RgbImage::new(6, 4);
        img.put_pixel(2, 1, Rgb([255, 0, 0]));
        let cropped = ImageTransforms::center_crop(&DynamicImage::ImageRgb8(img), 2).unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn center_crop_rejects_small_input() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(10, 10));
        assert!(ImageTransforms::center_crop(&image, 224).is_err());
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([255, 255, 255]));
        let gray = ImageTransforms::to_grayscale(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray, array![[76.0f32, 150.0, 255.0]]);
    }

    #[test]
    fn grayscale_matches_fixed_point_rounding() {
        // 浮点公式得到 151.499，定点结果为 152
        let img = RgbImage::from_pixel(1, 1, Rgb([7, 252, 13]));
        let gray = ImageTransforms::to_grayscale(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray[[0, 0]], 152.0);
    }

    #[test]
    fn flip_mirrors_columns() {
        let image = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(
            ImageTransforms::flip_horizontal(&image),
            array![[3.0f32, 2.0, 1.0], [6.0, 5.0, 4.0]]
        );
    }

    #[test]
    fn rotate_half_turn_reverses_both_axes() {
        let image = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let rotated = ImageTransforms::rotate(&image, 180.0);
        assert_eq!(rotated, array![[9.0f32, 8.0, 7.0], [6.0, 5.0, 4.0], [3.0, 2.0, 1.0]]);
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        let image = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let rotated = ImageTransforms::rotate(&image, 90.0);
        assert_eq!(rotated, array![[3.0f32, 6.0, 9.0], [2.0, 5.0, 8.0], [1.0, 4.0, 7.0]]);
    }

    #[test]
    fn translate_fills_with_zero() {
        let image = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(ImageTransforms::translate(&image, 1, 0), array![[0.0f32, 1.0], [0.0, 3.0]]);
        assert_eq!(ImageTransforms::translate(&image, 0, -1), array![[3.0f32, 4.0], [0.0, 0.0]]);
    }
}
