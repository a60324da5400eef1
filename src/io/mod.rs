/// CSV export of sweep curves and simulated timelines.
pub mod export;
/// CSV import of merged interval timelines.
pub mod timeline;
