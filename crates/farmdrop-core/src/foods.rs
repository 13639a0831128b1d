use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A catalog entry as declared in `foods.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodConfig {
    pub name: String,
    pub description: Option<String>,
    /// Unit price in USD, e.g. `"4.50"`.
    pub price: Decimal,
    /// Selling unit, e.g. `"dozen"` or `"lb"`.
    #[serde(default = "default_unit")]
    pub unit: String,
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_unit() -> String {
    "each".to_string()
}

fn default_available() -> bool {
    true
}

impl FoodConfig {
    #[must_use]
    pub fn slug(&self) -> String {
        slug_from_name(&self.name)
    }
}

/// Generate a URL-safe slug from a display name.
///
/// Lowercases, turns spaces into dashes, drops anything that is not ASCII
/// alphanumeric, and collapses repeated dashes.
#[must_use]
pub fn slug_from_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                Some(c)
            } else if c == ' ' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
pub struct FoodsFile {
    pub foods: Vec<FoodConfig>,
}

/// Load and validate the food catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_foods(path: &Path) -> Result<FoodsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FoodsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_foods(&content)
}

/// Parse and validate catalog YAML.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_foods(content: &str) -> Result<FoodsFile, ConfigError> {
    let foods_file: FoodsFile =
        serde_yaml::from_str(content).map_err(ConfigError::FoodsFileParse)?;

    validate_foods(&foods_file)?;

    Ok(foods_file)
}

fn validate_foods(foods_file: &FoodsFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for food in &foods_file.foods {
        if food.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "food name must be non-empty".to_string(),
            ));
        }

        if food.price <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "food '{}' has non-positive price {}",
                food.name, food.price
            )));
        }

        let slug = food.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "food '{}' does not produce a usable slug",
                food.name
            )));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate food slug: '{}' (from food '{}')",
                slug, food.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_spaces_and_punctuation() {
        assert_eq!(slug_from_name("Farm Fresh Eggs"), "farm-fresh-eggs");
        assert_eq!(slug_from_name("  Honey (Raw) -- 16oz "), "honey-raw-16oz");
        assert_eq!(slug_from_name("Kale & Chard"), "kale-chard");
    }

    #[test]
    fn parse_foods_applies_defaults() {
        let yaml = r#"
foods:
  - name: Farm Fresh Eggs
    price: "6.00"
    unit: dozen
  - name: Heirloom Tomatoes
    price: "4.25"
"#;
        let file = parse_foods(yaml).expect("valid yaml");
        assert_eq!(file.foods.len(), 2);
        assert_eq!(file.foods[0].unit, "dozen");
        assert_eq!(file.foods[1].unit, "each");
        assert!(file.foods[1].available);
        assert_eq!(file.foods[1].price, Decimal::new(425, 2));
    }

    #[test]
    fn parse_foods_rejects_duplicate_slugs() {
        let yaml = r#"
foods:
  - name: Kale
    price: "3.00"
  - name: "kale"
    price: "3.50"
"#;
        let err = parse_foods(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn parse_foods_rejects_zero_price() {
        let yaml = r#"
foods:
  - name: Free Sample
    price: "0"
"#;
        let err = parse_foods(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref m) if m.contains("non-positive")));
    }

    #[test]
    fn parse_foods_rejects_blank_name() {
        let yaml = r#"
foods:
  - name: "   "
    price: "1.00"
"#;
        assert!(matches!(
            parse_foods(yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn parse_foods_surfaces_yaml_errors() {
        assert!(matches!(
            parse_foods("foods: [unterminated"),
            Err(ConfigError::FoodsFileParse(_))
        ));
    }

    #[test]
    fn load_foods_reports_missing_file() {
        let err = load_foods(Path::new("/nonexistent/foods.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FoodsFileIo { ref path, .. } if path.contains("nonexistent")));
    }
}
