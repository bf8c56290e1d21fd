//! Static entity catalog: known candidate names and the two-level
//! region -> district taxonomy.
//!
//! Loaded once at startup and never mutated at runtime. Candidate names are
//! the fuzzy-match targets for extraction; regions and districts gate where
//! a finished tally may be filed.

use once_cell::sync::Lazy;

/// A region together with its ordered list of districts.
#[derive(Debug, Clone)]
pub struct Region {
    name: String,
    districts: Vec<String>,
}

impl Region {
    pub fn new(name: impl Into<String>, districts: Vec<String>) -> Self {
        Self {
            name: name.into(),
            districts,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn districts(&self) -> &[String] {
        &self.districts
    }
}

/// Immutable catalog of candidate names and the location taxonomy.
#[derive(Debug, Clone)]
pub struct Catalog {
    candidates: Vec<String>,
    regions: Vec<Region>,
}

impl Catalog {
    pub fn new(candidates: Vec<String>, regions: Vec<Region>) -> Self {
        Self {
            candidates,
            regions,
        }
    }

    /// Returns the process-wide default catalog.
    pub fn default_catalog() -> &'static Catalog {
        &DEFAULT_CATALOG
    }

    /// Canonical candidate names, in catalog order.
    ///
    /// Catalog order is significant: it is the deterministic tie-break when
    /// two candidates sit at the same edit distance from an extracted name.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Region names, in catalog order.
    pub fn region_names(&self) -> Vec<&str> {
        self.regions.iter().map(|r| r.name()).collect()
    }

    /// Checks whether the given name is a known region.
    pub fn is_region(&self, name: &str) -> bool {
        self.regions.iter().any(|r| r.name() == name)
    }

    /// Districts belonging to the given region, or None for an unknown region.
    pub fn districts(&self, region: &str) -> Option<&[String]> {
        self.regions
            .iter()
            .find(|r| r.name() == region)
            .map(|r| r.districts())
    }

    /// Resolves a district within a region to its canonical catalog spelling.
    pub fn find_district(&self, region: &str, district: &str) -> Option<&str> {
        self.districts(region)?
            .iter()
            .find(|d| d.as_str() == district)
            .map(|d| d.as_str())
    }
}

static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(|| {
    let candidates = [
        "Tobias",
        "Chilungo",
        "Chakwera",
        "Nankhumwa",
        "Bandawe",
        "Banda",
        "Muluzi",
        "Kaliya",
        "Mutharika",
        "Mwenifumbo",
        "Kabambe",
        "Chibambo",
        "Swira",
        "Mbewe",
        "Chilumpha",
        "Chipojola",
        "Dube",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let region = |name: &str, districts: &[&str]| {
        Region::new(name, districts.iter().map(|d| d.to_string()).collect())
    };

    let regions = vec![
        region(
            "Northern",
            &["Chitipa", "Karonga", "Likoma", "Mzimba", "Nkhata Bay", "Rumphi"],
        ),
        region(
            "Central",
            &[
                "Dedza",
                "Dowa",
                "Kasungu",
                "Lilongwe",
                "Mchinji",
                "Nkhotakota",
                "Ntcheu",
                "Ntchisi",
                "Salima",
            ],
        ),
        region(
            "Southern",
            &[
                "Balaka",
                "Blantyre",
                "Chikwawa",
                "Chiradzulu",
                "Machinga",
                "Mangochi",
                "Mulanje",
                "Mwanza",
                "Nsanje",
                "Thyolo",
                "Phalombe",
                "Zomba",
                "Neno",
            ],
        ),
    ];

    Catalog::new(candidates, regions)
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_expected_shape() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.candidates().len(), 17);
        assert_eq!(catalog.region_names(), vec!["Northern", "Central", "Southern"]);
        assert_eq!(catalog.districts("Northern").unwrap().len(), 6);
        assert_eq!(catalog.districts("Central").unwrap().len(), 9);
        assert_eq!(catalog.districts("Southern").unwrap().len(), 13);
    }

    #[test]
    fn districts_for_unknown_region_is_none() {
        assert!(Catalog::default_catalog().districts("Eastern").is_none());
    }

    #[test]
    fn find_district_returns_canonical_spelling() {
        let catalog = Catalog::default_catalog();
        assert_eq!(catalog.find_district("Northern", "Mzimba"), Some("Mzimba"));
        assert_eq!(catalog.find_district("Northern", "Zomba"), None);
    }

    #[test]
    fn is_region_checks_exact_name() {
        let catalog = Catalog::default_catalog();
        assert!(catalog.is_region("Central"));
        assert!(!catalog.is_region("central"));
    }
}
