//! Supplier field vocabulary.
//!
//! The supplier's export has changed casing and spelling across API versions
//! (`stock_id`, `StockID`, `Stock #`, ...). Each [`Field`] lists the spellings
//! we accept, most common first. Matching is done on a normalized form
//! (ASCII lowercase, alphanumerics only), see [`normalize_key`].

/// A domain attribute that can be read from a supplier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Stable stock identifier; the upsert key.
    StockId,
    Shape,
    Carat,
    Color,
    Clarity,
    Cut,
    Polish,
    Symmetry,
    Fluorescence,
    /// Grading laboratory (GIA, IGI, HRD, ...).
    Lab,
    CertificateNo,
    /// Rapaport list price per carat.
    RapPrice,
    /// Discount against the Rapaport price, in percent (usually negative).
    Discount,
    PricePerCarat,
    TotalPrice,
    /// Pre-formatted "L x W x D" string.
    Measurements,
    Length,
    Width,
    Depth,
    DepthPercent,
    TablePercent,
    Ratio,
    ImageUrl,
    VideoUrl,
    CertificateUrl,
    /// Availability as reported by the supplier (available, on hold, memo...).
    Status,
    Location,
    Comment,
    FancyColor,
    FancyIntensity,
    FancyOvertone,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: &'static [Field] = &[
        Field::StockId,
        Field::Shape,
        Field::Carat,
        Field::Color,
        Field::Clarity,
        Field::Cut,
        Field::Polish,
        Field::Symmetry,
        Field::Fluorescence,
        Field::Lab,
        Field::CertificateNo,
        Field::RapPrice,
        Field::Discount,
        Field::PricePerCarat,
        Field::TotalPrice,
        Field::Measurements,
        Field::Length,
        Field::Width,
        Field::Depth,
        Field::DepthPercent,
        Field::TablePercent,
        Field::Ratio,
        Field::ImageUrl,
        Field::VideoUrl,
        Field::CertificateUrl,
        Field::Status,
        Field::Location,
        Field::Comment,
        Field::FancyColor,
        Field::FancyIntensity,
        Field::FancyOvertone,
    ];

    /// Accepted spellings for this field, in priority order.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::StockId => &["stock_id", "stock_no", "stock_number", "stock", "sku"],
            Field::Shape => &["shape", "shape_name"],
            Field::Carat => &["carat", "carats", "carat_weight", "weight", "size"],
            Field::Color => &["color", "colour"],
            Field::Clarity => &["clarity"],
            Field::Cut => &["cut", "cut_grade"],
            Field::Polish => &["polish"],
            Field::Symmetry => &["symmetry", "sym"],
            Field::Fluorescence => &["fluorescence", "fluorescence_intensity", "fluor"],
            Field::Lab => &["lab", "grading_lab", "certificate_lab"],
            Field::CertificateNo => &["certificate_no", "cert_no", "report_no", "certificate_number"],
            Field::RapPrice => &["rap_price", "rapaport_price", "rap"],
            Field::Discount => &[
                "discount",
                "rap_discount",
                "disc",
                "discount_percent",
                "disc_percent",
                "rap_percent",
            ],
            Field::PricePerCarat => &["price_per_carat", "ppc", "price_carat"],
            Field::TotalPrice => &["total_price", "price", "net_value", "amount"],
            Field::Measurements => &["measurements", "measurement"],
            Field::Length => &["length", "measure_length"],
            Field::Width => &["width", "measure_width"],
            Field::Depth => &["depth", "measure_depth", "depth_mm"],
            Field::DepthPercent => &["depth_percent", "depth_pct", "total_depth"],
            Field::TablePercent => &["table_percent", "table_pct", "table"],
            Field::Ratio => &["ratio", "lw_ratio"],
            Field::ImageUrl => &["image_url", "image", "image_link", "diamond_image"],
            Field::VideoUrl => &["video_url", "video", "video_link"],
            Field::CertificateUrl => &["certificate_url", "cert_url", "certificate_link", "cert_link"],
            Field::Status => &["status", "availability"],
            Field::Location => &["location", "country", "city"],
            Field::Comment => &["comment", "comments", "remarks"],
            Field::FancyColor => &["fancy_color", "fancy_colour"],
            Field::FancyIntensity => &["fancy_intensity", "fancy_color_intensity"],
            Field::FancyOvertone => &["fancy_overtone", "fancy_color_overtone", "overtone"],
        }
    }
}

/// Normalized form of a supplier key: ASCII lowercase, alphanumerics only,
/// with `%` spelled out as `percent`.
///
/// `"Stock #"`, `"stock"` and `"STOCK"` all normalize to `"stock"`;
/// `"Depth %"` normalizes to `"depthpercent"`, not `"depth"`.
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c == '%' {
            out.push_str("percent");
        } else if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}
