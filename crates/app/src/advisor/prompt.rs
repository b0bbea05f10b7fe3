//! Adjustment request building.
//!
//! An [`AdjustmentRequest`] captures everything the advisor needs to dose a
//! pool: its configuration, the current test results, the water changes made
//! today, the stock on hand and the category-dependent targets. The request
//! renders itself into a prompt; the reply shape is fixed by
//! [`output_schema`].

use neupool_core::{
    Category, ChemicalReading, ChemistryTargets, InventoryItem, PoolConfig, Quantity, WaterEvents,
};
use serde_json::{Value, json};

/// Name of the tool the advisor is forced to call.
pub const TOOL_NAME: &str = "record_adjustments";

/// System prompt for every request.
pub const SYSTEM_PROMPT: &str = "You are a professional pool and spa service technician. \
Compute exact chemical doses from water test results and record them with the \
record_adjustments tool.";

/// One stocked chemical as presented to the advisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    /// Product name.
    pub name: String,
    /// Stock on hand.
    pub quantity: Quantity,
    /// Unit of measure.
    pub unit: String,
}

impl From<&InventoryItem> for StockLine {
    fn from(item: &InventoryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
        }
    }
}

/// Input for one advisor call.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentRequest {
    /// Pool being serviced.
    pub pool: PoolConfig,
    /// Current test results.
    pub readings: ChemicalReading,
    /// Water changes made today.
    pub water_events: WaterEvents,
    /// Stock on hand.
    pub inventory: Vec<StockLine>,
    /// Dosing targets for the pool's category.
    pub targets: ChemistryTargets,
}

impl AdjustmentRequest {
    /// Build a request, deriving targets from the pool category.
    #[must_use]
    pub fn new(
        pool: &PoolConfig,
        readings: &ChemicalReading,
        inventory: &[InventoryItem],
        water_events: WaterEvents,
    ) -> Self {
        Self {
            pool: pool.clone(),
            readings: readings.clone(),
            water_events,
            inventory: inventory.iter().map(StockLine::from).collect(),
            targets: ChemistryTargets::for_category(pool.category),
        }
    }

    /// Returns `true` if stabilizer and salt readings are likely understated.
    #[must_use]
    pub const fn dilution_warning(&self) -> bool {
        self.water_events.drained_half
    }

    /// Water changes as a sentence list, or "None".
    #[must_use]
    pub fn water_context(&self) -> String {
        let events = self.water_events;
        let sentences: Vec<&str> = [
            (events.added, "Fresh water was added."),
            (events.drained, "Water was drained."),
            (
                events.drained_half,
                "More than 50% of the water was drained and refilled.",
            ),
        ]
        .into_iter()
        .filter_map(|(happened, text)| happened.then_some(text))
        .collect();

        if sentences.is_empty() {
            "None".to_string()
        } else {
            sentences.join(" ")
        }
    }

    /// Stock on hand as `Name (qty unit available)` entries, or "None".
    #[must_use]
    pub fn inventory_list(&self) -> String {
        if self.inventory.is_empty() {
            return "None".to_string();
        }
        self.inventory
            .iter()
            .map(|line| format!("{} ({} {} available)", line.name, line.quantity, line.unit))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Render the user prompt.
    #[must_use]
    pub fn prompt(&self) -> String {
        let pool = &self.pool;
        let readings = &self.readings;
        let category = pool.category.as_str();
        let free_chlorine_note = match pool.category {
            Category::Spa => " (or higher if heavy use)",
            Category::Pool => "",
        };

        let mut lines = vec![
            "Pool Configuration:".to_string(),
            format!("- Name: {}", pool.name),
            format!("- Volume: {} gallons", pool.volume_gallons),
            format!(
                "- Category: {} (Important: adjust targets accordingly for Pool vs Spa)",
                category.to_uppercase()
            ),
            format!("- Sanitizer: {}", pool.sanitizer),
            format!("- Surface: {}", pool.surface),
            String::new(),
            "Water Adjustments Today:".to_string(),
            self.water_context(),
        ];

        if self.dilution_warning() {
            lines.push(
                "Warning: more than half of the water was replaced. Cyanuric acid (stabilizer) \
                 and salt readings are likely understated due to dilution."
                    .to_string(),
            );
        }

        lines.extend([
            String::new(),
            "Current Readings:".to_string(),
            format!("- pH: {}", readings.ph),
            format!("- Free Chlorine: {} ppm", readings.free_chlorine),
            format!("- Total Alkalinity: {} ppm", readings.total_alkalinity),
            format!("- Cyanuric Acid: {} ppm", readings.cyanuric_acid),
            readings.calcium_hardness.map_or_else(
                || "- Calcium Hardness: Not Measured".to_string(),
                |ch| format!("- Calcium Hardness: {ch} ppm"),
            ),
        ]);
        if let Some(salt) = readings.salt_level {
            lines.push(format!("- Salt Level: {salt} ppm"));
        }
        lines.extend([
            readings.temperature.map_or_else(
                || "- Temperature: Not Measured".to_string(),
                |t| format!("- Temperature: {t} F"),
            ),
            String::new(),
            format!("Available Inventory: {}", self.inventory_list()),
            String::new(),
            "Task:".to_string(),
            format!(
                "Calculate the exact chemical adjustments needed to balance this {category} to ideal levels."
            ),
            format!("Targets for {category}:"),
            format!("- pH: {}", self.targets.ph),
            format!(
                "- FC: {}ppm{free_chlorine_note}",
                self.targets.free_chlorine
            ),
            format!("- TA: {}ppm", self.targets.total_alkalinity),
            String::new(),
            "Prioritize using chemicals from the Available Inventory if possible.".to_string(),
            "If a chemical is needed but not in inventory, recommend a generic standard pool chemical."
                .to_string(),
            "If water was drained significantly, account for the loss of stabilizer (CYA) and salt."
                .to_string(),
            String::new(),
            format!("Record the result with the {TOOL_NAME} tool."),
        ]);

        lines.join("\n")
    }
}

/// JSON schema of the advisor's reply, sent as the tool's input schema.
#[must_use]
pub fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "analysis": {
                "type": "string",
                "description": "A brief summary of the water balance status."
            },
            "adjustments": {
                "type": "array",
                "description": "List of recommended chemical adjustments.",
                "items": {
                    "type": "object",
                    "properties": {
                        "chemicalName": {
                            "type": "string",
                            "description": "Name of the chemical to add (e.g., Muriatic Acid, Calcium Hypochlorite)."
                        },
                        "amount": {
                            "type": "number",
                            "minimum": 0,
                            "description": "Numeric amount to add."
                        },
                        "unit": {
                            "type": "string",
                            "description": "Unit of measurement (e.g., oz, lbs, cups, gallons)."
                        },
                        "reason": {
                            "type": "string",
                            "description": "Short explanation for why this is needed."
                        }
                    },
                    "required": ["chemicalName", "amount", "unit", "reason"]
                }
            }
        },
        "required": ["analysis", "adjustments"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use neupool_core::{NewInventoryItem, SanitizerType, Surface, TargetRange};

    fn spa() -> PoolConfig {
        PoolConfig {
            name: "Sunset Hotel Spa".to_string(),
            volume_gallons: 800,
            sanitizer: SanitizerType::Chlorine,
            surface: Surface::Fiberglass,
            category: Category::Spa,
        }
    }

    fn reading() -> ChemicalReading {
        ChemicalReading {
            ph: 7.9,
            free_chlorine: 2.0,
            total_alkalinity: 90.0,
            cyanuric_acid: 30.0,
            calcium_hardness: None,
            salt_level: None,
            temperature: Some(102.0),
        }
    }

    fn stock(name: &str, quantity: u32, unit: &str) -> InventoryItem {
        NewInventoryItem {
            name: name.to_string(),
            quantity: Quantity::from_whole(quantity),
            unit: Some(unit.to_string()),
            ..Default::default()
        }
        .into_item(Utc::now())
        .expect("valid item")
    }

    #[test]
    fn test_spa_targets() {
        let request = AdjustmentRequest::new(&spa(), &reading(), &[], WaterEvents::default());
        assert_eq!(request.targets.ph, TargetRange::new(7.2, 7.8));

        let prompt = request.prompt();
        assert!(prompt.contains("- pH: 7.2-7.8"));
        assert!(prompt.contains("- FC: 3-5ppm (or higher if heavy use)"));
        assert!(prompt.contains("Category: SPA"));
    }

    #[test]
    fn test_pool_targets() {
        let mut pool = spa();
        pool.category = Category::Pool;
        let prompt = AdjustmentRequest::new(&pool, &reading(), &[], WaterEvents::default()).prompt();

        assert!(prompt.contains("- pH: 7.4-7.6"));
        assert!(prompt.contains("- FC: 3-5ppm\n"));
        assert!(prompt.contains("- TA: 80-120ppm"));
    }

    #[test]
    fn test_missing_readings_marked() {
        let prompt =
            AdjustmentRequest::new(&spa(), &reading(), &[], WaterEvents::default()).prompt();

        assert!(prompt.contains("- Calcium Hardness: Not Measured"));
        assert!(prompt.contains("- Temperature: 102 F"));
        assert!(!prompt.contains("Salt Level"));
    }

    #[test]
    fn test_inventory_list() {
        let inventory = vec![stock("Muriatic Acid", 2, "gal"), stock("Shock", 10, "lbs")];
        let request = AdjustmentRequest::new(&spa(), &reading(), &inventory, WaterEvents::default());

        assert_eq!(
            request.inventory_list(),
            "Muriatic Acid (2 gal available), Shock (10 lbs available)"
        );

        let empty = AdjustmentRequest::new(&spa(), &reading(), &[], WaterEvents::default());
        assert_eq!(empty.inventory_list(), "None");
    }

    #[test]
    fn test_water_context() {
        let none = AdjustmentRequest::new(&spa(), &reading(), &[], WaterEvents::default());
        assert_eq!(none.water_context(), "None");
        assert!(!none.dilution_warning());

        let drained = AdjustmentRequest::new(
            &spa(),
            &reading(),
            &[],
            WaterEvents::new(true, false, true),
        );
        assert_eq!(
            drained.water_context(),
            "Fresh water was added. Water was drained. More than 50% of the water was drained and refilled."
        );
        assert!(drained.dilution_warning());
        assert!(drained.prompt().contains("likely understated due to dilution"));
    }

    #[test]
    fn test_output_schema_requires_fields() {
        let schema = output_schema();
        assert_eq!(schema["required"], json!(["analysis", "adjustments"]));
        assert_eq!(
            schema["properties"]["adjustments"]["items"]["required"],
            json!(["chemicalName", "amount", "unit", "reason"])
        );
    }
}
