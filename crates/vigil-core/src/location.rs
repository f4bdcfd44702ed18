//! Location reference collaborator
//!
//! Resolves province/city/district IDs and checks that a location descriptor
//! forms one consistent hierarchy. The engine only depends on the
//! [`LocationDirectory`] trait; [`InMemoryLocationDirectory`] serves static
//! reference tables loaded at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::data_model::LocationRef;
use crate::error::{Result, VigilError};

pub trait LocationDirectory: Send + Sync {
    fn province_name(&self, province_id: &str) -> Option<String>;

    /// Parent province of a city
    fn city_province(&self, city_id: &str) -> Option<String>;

    fn city_name(&self, city_id: &str) -> Option<String>;

    /// Parent city of a district
    fn district_city(&self, district_id: &str) -> Option<String>;

    fn district_name(&self, district_id: &str) -> Option<String>;

    /// Check that every ID exists and that district ∈ city ∈ province
    fn validate(&self, location: &LocationRef) -> Result<()> {
        if self.province_name(&location.province_id).is_none() {
            return Err(VigilError::invalid_field(
                "location.provinceId",
                format!("unknown province '{}'", location.province_id),
            ));
        }

        match self.city_province(&location.city_id) {
            None => {
                return Err(VigilError::invalid_field(
                    "location.cityId",
                    format!("unknown city '{}'", location.city_id),
                ))
            }
            Some(parent) if parent != location.province_id => {
                return Err(VigilError::invalid_field(
                    "location.cityId",
                    format!(
                        "city '{}' does not belong to province '{}'",
                        location.city_id, location.province_id
                    ),
                ))
            }
            Some(_) => {}
        }

        if let Some(district_id) = &location.district_id {
            match self.district_city(district_id) {
                None => {
                    return Err(VigilError::invalid_field(
                        "location.districtId",
                        format!("unknown district '{}'", district_id),
                    ))
                }
                Some(parent) if parent != location.city_id => {
                    return Err(VigilError::invalid_field(
                        "location.districtId",
                        format!(
                            "district '{}' does not belong to city '{}'",
                            district_id, location.city_id
                        ),
                    ))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// "District, City, Province" for display, when every part resolves
    fn describe(&self, location: &LocationRef) -> Option<String> {
        let province = self.province_name(&location.province_id)?;
        let city = self.city_name(&location.city_id)?;
        match &location.district_id {
            Some(d) => Some(format!("{}, {}, {}", self.district_name(d)?, city, province)),
            None => Some(format!("{}, {}", city, province)),
        }
    }
}

// ============================================================================
// IN-MEMORY DIRECTORY
// ============================================================================

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: String,
}

/// Static location tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryLocationDirectory {
    provinces: HashMap<String, String>,
    cities: HashMap<String, Node>,
    districts: HashMap<String, Node>,
}

/// YAML layout: provinces contain cities contain districts
#[derive(Debug, Deserialize, Serialize)]
struct ProvinceEntry {
    id: String,
    name: String,
    #[serde(default)]
    cities: Vec<CityEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct CityEntry {
    id: String,
    name: String,
    #[serde(default)]
    districts: Vec<DistrictEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct DistrictEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct DirectoryFile {
    provinces: Vec<ProvinceEntry>,
}

impl InMemoryLocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_province(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.provinces.insert(id.into(), name.into());
        self
    }

    pub fn with_city(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        province_id: impl Into<String>,
    ) -> Self {
        self.cities.insert(
            id.into(),
            Node {
                name: name.into(),
                parent: province_id.into(),
            },
        );
        self
    }

    pub fn with_district(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        city_id: impl Into<String>,
    ) -> Self {
        self.districts.insert(
            id.into(),
            Node {
                name: name.into(),
                parent: city_id.into(),
            },
        );
        self
    }

    /// Load the nested YAML layout
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: DirectoryFile = serde_yaml::from_str(yaml)
            .map_err(|e| VigilError::validation(format!("invalid location table: {}", e)))?;

        let mut dir = Self::new();
        for province in file.provinces {
            for city in province.cities {
                for district in city.districts {
                    dir = dir.with_district(district.id, district.name, city.id.clone());
                }
                dir = dir.with_city(city.id, city.name, province.id.clone());
            }
            dir = dir.with_province(province.id, province.name);
        }
        Ok(dir)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            VigilError::validation(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn len(&self) -> usize {
        self.provinces.len() + self.cities.len() + self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocationDirectory for InMemoryLocationDirectory {
    fn province_name(&self, province_id: &str) -> Option<String> {
        self.provinces.get(province_id).cloned()
    }

    fn city_province(&self, city_id: &str) -> Option<String> {
        self.cities.get(city_id).map(|c| c.parent.clone())
    }

    fn city_name(&self, city_id: &str) -> Option<String> {
        self.cities.get(city_id).map(|c| c.name.clone())
    }

    fn district_city(&self, district_id: &str) -> Option<String> {
        self.districts.get(district_id).map(|d| d.parent.clone())
    }

    fn district_name(&self, district_id: &str) -> Option<String> {
        self.districts.get(district_id).map(|d| d.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryLocationDirectory {
        InMemoryLocationDirectory::new()
            .with_province("31", "DKI Jakarta")
            .with_city("3171", "Jakarta Selatan", "31")
            .with_district("317101", "Tebet", "3171")
            .with_province("32", "Jawa Barat")
            .with_city("3273", "Bandung", "32")
    }

    fn location(province: &str, city: &str, district: Option<&str>) -> LocationRef {
        LocationRef {
            province_id: province.to_string(),
            city_id: city.to_string(),
            district_id: district.map(str::to_string),
            specific_location: None,
        }
    }

    #[test]
    fn test_consistent_hierarchy() {
        let dir = directory();
        assert!(dir.validate(&location("31", "3171", Some("317101"))).is_ok());
        assert!(dir.validate(&location("32", "3273", None)).is_ok());
    }

    #[test]
    fn test_city_outside_province() {
        let err = directory()
            .validate(&location("32", "3171", None))
            .unwrap_err();
        assert_eq!(err.field(), Some("location.cityId"));
    }

    #[test]
    fn test_district_outside_city() {
        let err = directory()
            .validate(&location("32", "3273", Some("317101")))
            .unwrap_err();
        assert_eq!(err.field(), Some("location.districtId"));
    }

    #[test]
    fn test_unknown_province() {
        let err = directory().validate(&location("99", "3171", None)).unwrap_err();
        assert_eq!(err.field(), Some("location.provinceId"));
    }

    #[test]
    fn test_describe() {
        let dir = directory();
        assert_eq!(
            dir.describe(&location("31", "3171", Some("317101"))).as_deref(),
            Some("Tebet, Jakarta Selatan, DKI Jakarta")
        );
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
provinces:
  - id: "31"
    name: DKI Jakarta
    cities:
      - id: "3171"
        name: Jakarta Selatan
        districts:
          - id: "317101"
            name: Tebet
"#;
        let dir = InMemoryLocationDirectory::from_yaml(yaml).unwrap();
        assert_eq!(dir.len(), 3);
        assert_eq!(dir.district_city("317101").as_deref(), Some("3171"));
    }
}
