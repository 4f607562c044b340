/// Input handling for the water quality service.
///
/// Submodules:
/// - `form`: parses raw replicate text from the data-entry form (or a
///   sample file) into validated `SampleReadings`.

pub mod form;
