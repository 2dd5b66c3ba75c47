//! Tiling of parametric wire patterns.
//!
//! A periodic wire pattern describes one unit cell. This crate instantiates
//! it many times to build a larger network:
//!
//! - [`WireTiler`] - one pattern over a box ([`WireTiler::tile_with_box`]) or
//!   over the cells of a [`GuideMesh`], with per-cell DOFs painted from cell
//!   attributes
//! - [`MixedMeshTiler`] - several patterns, chosen per cell by `pattern_id`
//!
//! Each cell maps the pattern's bounding box onto the cell by trilinear
//! (bilinear) interpolation. Cells are generated independently, optionally
//! in parallel, and welded afterwards with a tolerance hash grid. Tiled
//! networks carry the evaluated thickness as a `thickness` attribute.
//!
//! # Example
//!
//! ```
//! use wire_params::{ParameterManager, TargetType};
//! use wire_tiler::{TilerConfig, WireTiler};
//! use wire_types::{parse_wire, Aabb};
//! use nalgebra::Point3;
//!
//! let pattern = parse_wire("v 0 0 0\nv 1 1 1\nl 1 2\n").unwrap();
//! let params = ParameterManager::new(&pattern, 0.05, TargetType::Edge);
//! let tiler = WireTiler::new(pattern).with_config(TilerConfig::default().with_parallel(true));
//! let bbox = Aabb::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
//! let tiled = tiler.tile_with_box(&params, &bbox, [2, 2, 2]).unwrap();
//! assert_eq!(tiled.num_edges(), 8);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
// Cell counts and pattern ids convert between usize and f64.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

mod config;
mod error;
mod guide;
mod mixed;
mod tiler;

pub use config::TilerConfig;
pub use error::{TilerError, TilerResult};
pub use guide::{dof_attribute_name, GuideMesh, PATTERN_ID_ATTRIBUTE};
pub use mixed::MixedMeshTiler;
pub use tiler::{WireTiler, THICKNESS_ATTRIBUTE};
