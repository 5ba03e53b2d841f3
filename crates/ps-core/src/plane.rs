use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    data: Vec<T>,
}

impl<T> Plane<T> {
    /// Wraps a tightly packed buffer (`stride == width * channels`).
    pub fn from_vec(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self, Error> {
        check_channels(channels)?;
        let row_len = width.checked_mul(channels).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        let expected = row_len.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            stride: row_len,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn as_view(&self) -> PlaneView<'_, T> {
        PlaneView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.stride,
            data: &self.data,
        }
    }

    pub fn as_view_mut(&mut self) -> PlaneViewMut<'_, T> {
        PlaneViewMut {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.stride,
            data: &mut self.data,
        }
    }
}

impl<T: Clone> Plane<T> {
    pub fn new_fill(width: usize, height: usize, channels: usize, value: T) -> Self {
        let len = width
            .checked_mul(channels)
            .and_then(|row| row.checked_mul(height))
            .expect("plane size overflow");
        Self {
            width,
            height,
            channels,
            stride: width * channels,
            data: vec![value; len],
        }
    }

    /// Allocates a padded plane. Allocation failure is reported instead of
    /// aborting.
    pub fn with_stride(
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
        value: T,
    ) -> Result<Self, Error> {
        check_channels(channels)?;
        let row_len = width.checked_mul(channels).ok_or(Error::InvalidStride)?;
        if stride < row_len {
            return Err(Error::InvalidStride);
        }
        let len = stride.checked_mul(height).ok_or(Error::Allocation(usize::MAX))?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| Error::Allocation(len))?;
        data.resize(len, value);

        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a, T> {
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    data: &'a [T],
}

impl<'a, T> PlaneView<'a, T> {
    pub fn from_slice(
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        check_layout(width, height, channels, stride, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Samples per row excluding padding.
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.row_len()]
    }

    /// Returns all channels of one pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y * self.stride + x * self.channels;
        self.data.get(start..start + self.channels)
    }

    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height || c >= self.channels {
            return None;
        }
        self.data.get(y * self.stride + x * self.channels + c)
    }

    pub fn subview(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<PlaneView<'a, T>, Error> {
        if x > self.width
            || y > self.height
            || width > (self.width - x)
            || height > (self.height - y)
        {
            return Err(Error::OutOfBounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.channels))
            .ok_or(Error::OutOfBounds)?;
        let min_len = min_required_len(width * self.channels, height, self.stride)
            .ok_or(Error::OutOfBounds)?;
        let tail = self.data.get(start..).ok_or(Error::OutOfBounds)?;

        if tail.len() < min_len {
            return Err(Error::OutOfBounds);
        }

        Ok(PlaneView {
            width,
            height,
            channels: self.channels,
            stride: self.stride,
            data: tail,
        })
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.row_len()
    }

    pub fn as_contiguous_slice(&self) -> Option<&'a [T]> {
        if !self.is_contiguous() {
            return None;
        }
        self.data.get(0..self.row_len() * self.height)
    }
}

#[derive(Debug)]
pub struct PlaneViewMut<'a, T> {
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    data: &'a mut [T],
}

impl<'a, T> PlaneViewMut<'a, T> {
    pub fn from_slice_mut(
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
        data: &'a mut [T],
    ) -> Result<Self, Error> {
        check_layout(width, height, channels, stride, data.len())?;
        Ok(Self {
            width,
            height,
            channels,
            stride,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.row_len()]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.stride;
        let len = self.row_len();
        &mut self.data[start..start + len]
    }

    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<&T> {
        if x >= self.width || y >= self.height || c >= self.channels {
            return None;
        }
        self.data.get(y * self.stride + x * self.channels + c)
    }

    pub fn get_mut(&mut self, x: usize, y: usize, c: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height || c >= self.channels {
            return None;
        }
        self.data.get_mut(y * self.stride + x * self.channels + c)
    }

    pub fn as_view(&self) -> PlaneView<'_, T> {
        PlaneView {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.stride,
            data: self.data,
        }
    }

    pub fn subview_mut(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<PlaneViewMut<'_, T>, Error> {
        if x > self.width
            || y > self.height
            || width > (self.width - x)
            || height > (self.height - y)
        {
            return Err(Error::OutOfBounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.channels))
            .ok_or(Error::OutOfBounds)?;
        let min_len = min_required_len(width * self.channels, height, self.stride)
            .ok_or(Error::OutOfBounds)?;

        if start > self.data.len() {
            return Err(Error::OutOfBounds);
        }
        let (_, tail) = self.data.split_at_mut(start);
        if tail.len() < min_len {
            return Err(Error::OutOfBounds);
        }

        Ok(PlaneViewMut {
            width,
            height,
            channels: self.channels,
            stride: self.stride,
            data: tail,
        })
    }

    /// Splits the view into disjoint bands of `rows` rows each (the last
    /// band may be shorter). Band `i` starts at row `i * rows`.
    pub fn bands_mut(&mut self, rows: usize) -> Vec<PlaneViewMut<'_, T>> {
        if rows == 0 || self.height == 0 {
            return Vec::new();
        }

        let band_len = rows * self.stride;
        let used = self.data.len().min(self.stride * self.height);
        let (width, channels, stride, height) = (self.width, self.channels, self.stride, self.height);

        self.data[..used]
            .chunks_mut(band_len)
            .enumerate()
            .map(|(i, chunk)| PlaneViewMut {
                width,
                height: rows.min(height - i * rows),
                channels,
                stride,
                data: chunk,
            })
            .collect()
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.row_len()
    }
}

impl<T: Copy> PlaneViewMut<'_, T> {
    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    /// Copies a view of identical geometry row by row.
    pub fn copy_from(&mut self, src: &PlaneView<'_, T>) -> Result<(), Error> {
        if src.width() != self.width
            || src.height() != self.height
            || src.channels() != self.channels
        {
            return Err(Error::SizeMismatch {
                expected: self.row_len() * self.height,
                actual: src.row_len() * src.height(),
            });
        }

        for y in 0..self.height {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
        Ok(())
    }
}

fn check_channels(channels: usize) -> Result<(), Error> {
    if !(1..=4).contains(&channels) {
        return Err(Error::InvalidChannels(channels));
    }
    Ok(())
}

fn check_layout(
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
    len: usize,
) -> Result<(), Error> {
    check_channels(channels)?;
    let row_len = width.checked_mul(channels).ok_or(Error::InvalidStride)?;
    if stride < row_len {
        return Err(Error::InvalidStride);
    }

    let min_len = min_required_len(row_len, height, stride).ok_or(Error::SizeMismatch {
        expected: usize::MAX,
        actual: len,
    })?;

    if len < min_len {
        return Err(Error::SizeMismatch {
            expected: min_len,
            actual: len,
        });
    }
    Ok(())
}

fn min_required_len(row_len: usize, height: usize, stride: usize) -> Option<usize> {
    if row_len == 0 || height == 0 {
        return Some(0);
    }

    let rows_before_last = height.checked_sub(1)?;
    let base = rows_before_last.checked_mul(stride)?;
    base.checked_add(row_len)
}

#[cfg(test)]
mod tests {
    use super::{Plane, PlaneView, PlaneViewMut};
    use crate::Error;

    #[test]
    fn view_indexing_with_padded_stride() {
        let data = vec![1u8, 2, 3, 99, 4, 5, 6, 88];
        let view = PlaneView::from_slice(3, 2, 1, 4, &data).expect("valid view");

        assert_eq!(view.row(0), &[1, 2, 3]);
        assert_eq!(view.row(1), &[4, 5, 6]);
        assert_eq!(view.get(0, 1, 0), Some(&4));
        assert_eq!(view.get(2, 1, 0), Some(&6));
        assert_eq!(view.get(3, 1, 0), None);
        assert!(!view.is_contiguous());
        assert!(view.as_contiguous_slice().is_none());
    }

    #[test]
    fn interleaved_pixels_and_short_last_row() {
        // Two-channel plane, 2 pixels wide, stride 6, last row unpadded.
        let data = vec![
            10u16, 11, 20, 21, 0, 0, // row 0
            30, 31, 40, 41, // row 1
        ];
        let view = PlaneView::from_slice(2, 2, 2, 6, &data).expect("valid view");

        assert_eq!(view.row_len(), 4);
        assert_eq!(view.pixel(1, 0), Some(&[20u16, 21][..]));
        assert_eq!(view.pixel(0, 1), Some(&[30u16, 31][..]));
        assert_eq!(view.get(1, 1, 1), Some(&41));
        assert_eq!(view.get(1, 1, 2), None);
    }

    #[test]
    fn rejects_bad_layouts() {
        let data = vec![0u8; 8];
        assert_eq!(
            PlaneView::from_slice(3, 2, 1, 2, &data).unwrap_err(),
            Error::InvalidStride
        );
        assert_eq!(
            PlaneView::from_slice(2, 2, 5, 10, &data).unwrap_err(),
            Error::InvalidChannels(5)
        );
        assert_eq!(
            PlaneView::from_slice(4, 3, 1, 4, &data).unwrap_err(),
            Error::SizeMismatch {
                expected: 12,
                actual: 8
            }
        );
        assert!(Plane::from_vec(2, 2, 2, vec![0u8; 7]).is_err());
    }

    #[test]
    fn subview_non_contiguous_parent() {
        let data = vec![
            10u8, 11, 12, 13, 99, // row 0
            20, 21, 22, 23, 98, // row 1
            30, 31, 32, 33, 97, // row 2
        ];
        let parent = PlaneView::from_slice(4, 3, 1, 5, &data).expect("valid parent");
        let sub = parent.subview(1, 1, 3, 2).expect("valid subview");

        assert_eq!(sub.width(), 3);
        assert_eq!(sub.height(), 2);
        assert_eq!(sub.stride(), 5);
        assert_eq!(sub.row(0), &[21, 22, 23]);
        assert_eq!(sub.row(1), &[31, 32, 33]);
    }

    #[test]
    fn bands_cover_all_rows_disjointly() {
        let mut plane = Plane::with_stride(3, 5, 1, 4, 0u8).expect("alloc");
        {
            let mut view = plane.as_view_mut();
            let bands = view.bands_mut(2);
            assert_eq!(bands.len(), 3);
            assert_eq!(
                bands.iter().map(|b| b.height()).collect::<Vec<_>>(),
                vec![2, 2, 1]
            );
            for (i, mut band) in bands.into_iter().enumerate() {
                band.fill(i as u8 + 1);
            }
        }

        let view = plane.as_view();
        assert_eq!(view.row(0), &[1, 1, 1]);
        assert_eq!(view.row(1), &[1, 1, 1]);
        assert_eq!(view.row(2), &[2, 2, 2]);
        assert_eq!(view.row(4), &[3, 3, 3]);
        // Padding is untouched.
        assert_eq!(plane.data()[3], 0);
    }

    #[test]
    fn copy_from_and_subview_mut() {
        let src = Plane::from_vec(2, 2, 1, vec![1u8, 2, 3, 4]).expect("valid plane");
        let mut dst = Plane::with_stride(2, 2, 1, 3, 0u8).expect("alloc");
        dst.as_view_mut()
            .copy_from(&src.as_view())
            .expect("same geometry");
        assert_eq!(dst.data(), &[1, 2, 0, 3, 4, 0]);

        let mut data = vec![0u8; 9];
        let mut parent = PlaneViewMut::from_slice_mut(3, 3, 1, 3, &mut data).expect("valid");
        let mut sub = parent.subview_mut(1, 1, 2, 2).expect("valid subview");
        *sub.get_mut(1, 1, 0).expect("in bounds") = 42;
        assert_eq!(data[8], 42);

        let wrong = Plane::from_vec(1, 1, 1, vec![9u8]).expect("valid plane");
        assert!(dst.as_view_mut().copy_from(&wrong.as_view()).is_err());
    }
}
