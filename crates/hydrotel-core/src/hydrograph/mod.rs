/// Unit-hydrograph precomputation.
///
/// Once per configuration: route a unit pulse over each zone's pixels with
/// an implicit kinematic-wave solver and record the fraction arriving at
/// the channel network per timestep lag. Cached on disk and reloaded when
/// the configuration matches.
pub mod cache;
pub mod precompute;
pub mod raster;
pub mod solver;
pub mod topology;
