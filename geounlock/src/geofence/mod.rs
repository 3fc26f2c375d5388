//! Geofence slot allocation.
//!
//! Platforms cap how many circular regions an app may monitor at once. This
//! module decides which locked landmarks occupy those slots and applies the
//! decision through a [`RegionMonitorPort`].
//!
//! # Example
//!
//! ```ignore
//! use geounlock::geofence::{GeofenceAllocator, InMemoryRegionMonitor};
//!
//! let monitor = InMemoryRegionMonitor::new(20);
//! let mut allocator = GeofenceAllocator::new(20, 100.0);
//!
//! let report = allocator.recompute(&monitor, registry.landmarks(), &visited, Some(here));
//! assert!(report.active_count <= 20);
//! ```

mod allocator;
mod monitor;
mod region;

pub use allocator::{AllocationMode, AllocationReport, GeofenceAllocator};
pub use monitor::{InMemoryRegionMonitor, MonitorError, RegionMonitorPort};
pub use region::MonitoredRegion;
