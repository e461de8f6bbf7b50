use std::fmt;

/// Formats a byte count in kilobytes, or in megabytes from 1024 KB upwards,
/// with two decimals and comma separated thousands.
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 {
        format!("{} KB", group_thousands(kb))
    } else {
        format!("{} MB", group_thousands(kb / 1024.0))
    }
}

fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    let (integer, fraction) = formatted.split_at(formatted.len() - 3);

    let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push_str(fraction);
    grouped
}

/// Size of a compressed stream compared to the raw RGB data and, when known,
/// to the file the image was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    pub raw_size: u64,
    pub compressed_size: u64,
    pub original_file_size: Option<u64>,
}

fn reduction(compressed: u64, reference: u64) -> f64 {
    (1.0 - compressed as f64 / reference as f64) * 100.0
}

impl CompressionStats {
    pub fn new(width: u32, height: u32, compressed_size: u64) -> CompressionStats {
        CompressionStats {
            raw_size: width as u64 * height as u64 * 3,
            compressed_size,
            original_file_size: None,
        }
    }

    pub fn with_original_file_size(mut self, size: u64) -> CompressionStats {
        self.original_file_size = Some(size);
        self
    }

    /// Size reduction relative to the raw RGB data, in percent.
    pub fn raw_reduction(&self) -> f64 {
        reduction(self.compressed_size, self.raw_size)
    }

    /// Size reduction relative to the original file, in percent.
    pub fn file_reduction(&self) -> Option<f64> {
        self.original_file_size
            .map(|size| reduction(self.compressed_size, size))
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(size), Some(ratio)) = (self.original_file_size, self.file_reduction()) {
            writeln!(f, "[Original File Comparison]")?;
            writeln!(f, "{:<24}: {:>10}", "Original File Size", format_size(size))?;
            writeln!(f, "{:<24}: {:>10}", "Compressed Size", format_size(self.compressed_size))?;
            writeln!(f, "{:<24}: {:>9.2}%", "Size Reduction", ratio)?;
            writeln!(f)?;
        }
        writeln!(f, "[Raw RGB Data Comparison]")?;
        writeln!(f, "{:<24}: {:>10}", "Raw RGB Size", format_size(self.raw_size))?;
        writeln!(f, "{:<24}: {:>10}", "Compressed Size", format_size(self.compressed_size))?;
        write!(f, "{:<24}: {:>9.2}%", "Size Reduction", self.raw_reduction())
    }
}
