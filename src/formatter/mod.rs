pub struct Formatter {}

impl Formatter {
    const UNITS: [&'static str; 5] = ["B", "KB", "MB", "GB", "TB"];

    pub fn format_size(size: u64, precision: u8) -> String {
        let mut size_float = size as f64;
        let mut unit = 0;
        while size_float > 1024.0 && unit < Self::UNITS.len() - 1 {
            size_float /= 1024.0;
            unit += 1;
        }

        format!(
            "{number:.prec$} {unit}",
            number = size_float,
            prec = precision as usize,
            unit = Self::UNITS[unit]
        )
    }
}
