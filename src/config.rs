/// Knobs for one conversion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// `<= 1` keeps every row; `n > 1` drops rows whose position is a multiple of `n`.
    pub stride: i64,
    /// Emit only the time of day in the timestamp column.
    pub discard_date: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            stride: 0,
            discard_date: true,
        }
    }
}

impl ConvertOptions {
    /// Build options from the optional positional arguments.
    ///
    /// The date flag is read by string truthiness: any non-empty value,
    /// `False` included, keeps `discard_date` on. Only `""` turns it off.
    pub fn from_args(stride: Option<i64>, discard_date_flag: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            stride: stride.unwrap_or(defaults.stride),
            discard_date: discard_date_flag.map_or(defaults.discard_date, |flag| !flag.is_empty()),
        }
    }
}
