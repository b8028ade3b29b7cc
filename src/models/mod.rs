use url::Url;

/// Path segment that precedes region and category in a listing URL
const LISTING_PATH_ROOT: &str = "oglasi-prodaja";

/// Category and region of the listings reached from one seed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub category: String,
    pub region: String,
}

impl PageContext {
    /// Derive the context from a URL shaped like `/oglasi-prodaja/<region>/<category>/`.
    ///
    /// Anything else yields empty strings.
    pub fn from_url(url: &str) -> Self {
        let Ok(parsed) = Url::parse(url) else {
            return Self::default();
        };
        let segments: Vec<&str> = match parsed.path_segments() {
            Some(segments) => segments.collect(),
            None => return Self::default(),
        };

        if segments.first() != Some(&LISTING_PATH_ROOT) {
            return Self::default();
        }

        Self {
            region: segments.get(1).unwrap_or(&"").to_string(),
            category: segments.get(2).unwrap_or(&"").to_string(),
        }
    }
}

/// Which page layout a listing block came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingLayout {
    /// Only title and flattened text; area and build year live inside the text
    TextOnly,
    /// Area and build year read from the disambiguating description list
    Described {
        area: String,
        year_built: Option<String>,
    },
}

/// One listing as pulled off a rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListingBlock {
    pub title: String,
    pub text: String,
    pub layout: ListingLayout,
    pub context: PageContext,
}

/// Who published the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferType {
    Private,
    Agency,
}

impl OfferType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "Zasebna",
            Self::Agency => "Agencija",
        }
    }
}

/// A parsed listing that has not been assigned an ID yet
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedListing {
    pub category: String,
    pub room_count: Option<f64>,
    pub property_type_detail: Option<String>,
    pub region: String,
    pub location_detail: String,
    pub area_sqm: Option<f64>,
    pub year_built: Option<String>,
    pub year_renovated: Option<String>,
    pub offer_type: OfferType,
    pub price: Option<String>,
}

impl ParsedListing {
    /// Names of the core columns that came back empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.room_count.is_none() {
            missing.push(Column::RoomCount.title());
        }
        if self.area_sqm.is_none() {
            missing.push(Column::Area.title());
        }
        if self.price.is_none() {
            missing.push(Column::Price.title());
        }
        missing
    }
}

/// Output row: a parsed listing stamped with its run-scoped ID
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    id: u64,
    listing: ParsedListing,
}

impl ListingRecord {
    pub fn new(id: u64, listing: ParsedListing) -> Self {
        Self { id, listing }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn listing(&self) -> &ParsedListing {
        &self.listing
    }

    /// Render one cell; empty fields become empty strings
    pub fn cell(&self, column: Column) -> String {
        let l = &self.listing;
        match column {
            Column::Id => self.id.to_string(),
            Column::Category => l.category.clone(),
            Column::RoomCount => opt_float(l.room_count),
            Column::PropertyTypeDetail => l.property_type_detail.clone().unwrap_or_default(),
            Column::Region => l.region.clone(),
            Column::LocationDetail => l.location_detail.clone(),
            Column::Area => opt_float(l.area_sqm),
            Column::YearBuilt => l.year_built.clone().unwrap_or_default(),
            Column::YearRenovated => l.year_renovated.clone().unwrap_or_default(),
            Column::OfferType => l.offer_type.as_str().to_string(),
            Column::Price => l.price.clone().unwrap_or_default(),
        }
    }

    pub fn row(&self, columns: &[Column]) -> Vec<String> {
        columns.iter().map(|c| self.cell(*c)).collect()
    }
}

fn opt_float(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Columns of the output table, in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Category,
    RoomCount,
    PropertyTypeDetail,
    Region,
    LocationDetail,
    Area,
    YearBuilt,
    YearRenovated,
    OfferType,
    Price,
}

impl Column {
    pub fn title(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Category => "tip",
            Self::RoomCount => "st_sob",
            Self::PropertyTypeDetail => "hisa_tip",
            Self::Region => "lokacija",
            Self::LocationDetail => "lokacija_podrobno",
            Self::Area => "m2",
            Self::YearBuilt => "leto_gradnje",
            Self::YearRenovated => "leto_adaptacije",
            Self::OfferType => "tip_ponudbe",
            Self::Price => "cena",
        }
    }

    /// Column set, with or without `hisa_tip` and `lokacija_podrobno`
    pub fn layout(detailed: bool) -> Vec<Column> {
        let mut columns = vec![Self::Id, Self::Category, Self::RoomCount];
        if detailed {
            columns.push(Self::PropertyTypeDetail);
        }
        columns.push(Self::Region);
        if detailed {
            columns.push(Self::LocationDetail);
        }
        columns.extend([
            Self::Area,
            Self::YearBuilt,
            Self::YearRenovated,
            Self::OfferType,
            Self::Price,
        ]);
        columns
    }
}
