//! LesionStag Rust Extensions
//!
//! Segmentation primitives for dermatology image annotation, implemented in
//! Rust with Python bindings via PyO3 and WASM bindings for JavaScript.
//!
//! ## Image Format
//! Inputs are `(height, width, channels)` u8 arrays:
//! - **Grayscale**: (height, width, 1)
//! - **RGB**: (height, width, 3)
//!
//! Masks are `(height, width)` u8 arrays holding only 0 and 255. Superpixel
//! labels are `(height, width)` u32 arrays, persisted as 3-channel images.
//!
//! ## Pipeline
//! Region growing from a seed, hole filling and contour tracing make up the
//! interactive "click to segment" path. Rasterization turns a stored contour
//! back into a mask. Superpixels are computed independently of all of these.
//!
//! ## Coordinates
//! Public points and seeds use `(x, y)` = (column, row). Arrays are indexed
//! `[[row, col]]` internally.

pub mod buffer;
pub mod codec;
pub mod error;
pub mod segmentation;
pub mod superpixels;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use buffer::{Connectivity, Mask};
pub use error::{Result, SegmentationError};
pub use segmentation::{
    contour_to_mask, fill_holes, grow_region, mask_to_contour, segment, Contour, Point, SeedPoint,
};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::buffer::{ensure_single_component, normalize_mask, Connectivity};
    use crate::error::SegmentationError;
    use crate::segmentation::{self, Contour, Point, SeedPoint};
    use crate::superpixels::{self, encoding};

    impl From<SegmentationError> for PyErr {
        fn from(err: SegmentationError) -> Self {
            PyValueError::new_err(err.to_string())
        }
    }

    fn connectivity_from(value: u8) -> PyResult<Connectivity> {
        match value {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            other => Err(PyValueError::new_err(format!(
                "connectivity must be 4 or 8, got {other}"
            ))),
        }
    }

    fn points_of(contour: Contour) -> Vec<(f64, f64)> {
        contour.points.into_iter().map(|p| (p.x, p.y)).collect()
    }

    // ========================================================================
    // Segmentation
    // ========================================================================

    /// Grow a region from `(x, y)` and fill its holes.
    #[pyfunction]
    pub fn segment<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        x: i64,
        y: i64,
        tolerance: u32,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let mask = segmentation::segment(image.as_array(), SeedPoint::new(x, y), tolerance)?;
        Ok(mask.into_pyarray(py))
    }

    /// Flood fill from `(x, y)` over pixels within `tolerance` of the seed.
    #[pyfunction]
    #[pyo3(signature = (image, x, y, tolerance, connectivity=8))]
    pub fn grow_region<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        x: i64,
        y: i64,
        tolerance: u32,
        connectivity: u8,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let mask = segmentation::grow_region(
            image.as_array(),
            SeedPoint::new(x, y),
            tolerance,
            connectivity_from(connectivity)?,
        )?;
        Ok(mask.into_pyarray(py))
    }

    #[pyfunction]
    pub fn fill_holes<'py>(
        py: Python<'py>,
        mask: PyReadonlyArray2<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let mask = normalize_mask(mask.as_array())?;
        Ok(segmentation::fill_holes(mask.view()).into_pyarray(py))
    }

    /// Outer boundary of a single-component mask as a closed list of `(x, y)`.
    #[pyfunction]
    pub fn mask_to_contour(mask: PyReadonlyArray2<'_, u8>) -> PyResult<Vec<(f64, f64)>> {
        let mask = normalize_mask(mask.as_array())?;
        ensure_single_component(mask.view(), Connectivity::Eight)?;
        Ok(points_of(segmentation::mask_to_contour(mask.view())))
    }

    /// Even-odd fill of a closed `(x, y)` polygon.
    #[pyfunction]
    pub fn contour_to_mask<'py>(
        py: Python<'py>,
        height: usize,
        width: usize,
        points: Vec<(f64, f64)>,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let contour = Contour {
            points: points.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
        };
        let mask = segmentation::contour_to_mask((height, width), &contour)?;
        Ok(mask.into_pyarray(py))
    }

    // ========================================================================
    // Superpixels
    // ========================================================================

    /// SLIC superpixel labels, dense from 0.
    #[pyfunction]
    #[pyo3(signature = (image, num_segments=1000))]
    pub fn superpixels<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        num_segments: usize,
    ) -> PyResult<Bound<'py, PyArray2<u32>>> {
        // Release the GIL; the partition runs on the rayon pool
        let image = image.as_array().to_owned();
        let labels = py.allow_threads(|| superpixels::partition(image.view(), num_segments))?;
        Ok(labels.into_pyarray(py))
    }

    #[pyfunction]
    pub fn encode_superpixels<'py>(
        py: Python<'py>,
        labels: PyReadonlyArray2<'py, u32>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        Ok(encoding::encode_labels(labels.as_array())?.into_pyarray(py))
    }

    #[pyfunction]
    pub fn decode_superpixels<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray2<u32>>> {
        Ok(encoding::decode_labels(image.as_array())?.into_pyarray(py))
    }

    #[pymodule]
    pub fn lesionstag_rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Click-to-segment path
        m.add_function(wrap_pyfunction!(segment, m)?)?;
        m.add_function(wrap_pyfunction!(grow_region, m)?)?;
        m.add_function(wrap_pyfunction!(fill_holes, m)?)?;
        m.add_function(wrap_pyfunction!(mask_to_contour, m)?)?;
        m.add_function(wrap_pyfunction!(contour_to_mask, m)?)?;

        // Superpixels
        m.add_function(wrap_pyfunction!(superpixels, m)?)?;
        m.add_function(wrap_pyfunction!(encode_superpixels, m)?)?;
        m.add_function(wrap_pyfunction!(decode_superpixels, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::lesionstag_rust;
