// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::Date;

use crate::{
    BarangayId, BuildingComponentId, ClassificationId, DeclarantStatus, KindId, ScreenKind,
    StructureId, SubclassId, UserId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationFormInput {
    pub classification: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubclassFormInput {
    pub class_id: ClassificationId,
    pub barangay_id: Option<BarangayId>,
    pub subclass: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubclassRateFormInput {
    pub subclass_id: SubclassId,
    pub rate: f64,
    pub effective_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarangayFormInput {
    pub district_id: i64,
    pub barangay: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindFormInput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentLevelFormInput {
    pub kind_id: KindId,
    pub class_id: Option<ClassificationId>,
    pub effective_year: String,
    pub range_low: f64,
    pub range_high: f64,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureFormInput {
    pub structure_code: String,
    pub description: String,
    pub effective_date: Option<Date>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingCodeFormInput {
    pub structure_id: StructureId,
    pub building_code: String,
    pub description: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingComponentFormInput {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildingSubComponentFormInput {
    pub building_com_id: BuildingComponentId,
    pub description: String,
    pub rate: f64,
    pub percent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandAdjustmentFormInput {
    pub description: String,
    pub adjustment_factor: f64,
    pub adjustment_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxRateFormInput {
    pub effective_year: String,
    pub rate_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFormInput {
    pub user_id: UserId,
    pub device_name: String,
    pub registered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarantFormInput {
    pub declarant: String,
    pub status: DeclarantStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPayload {
    Classification(ClassificationFormInput),
    Subclass(SubclassFormInput),
    SubclassRate(SubclassRateFormInput),
    Barangay(BarangayFormInput),
    Kind(KindFormInput),
    AssessmentLevel(AssessmentLevelFormInput),
    Structure(StructureFormInput),
    BuildingCode(BuildingCodeFormInput),
    BuildingComponent(BuildingComponentFormInput),
    BuildingSubComponent(BuildingSubComponentFormInput),
    LandAdjustment(LandAdjustmentFormInput),
    TaxRate(TaxRateFormInput),
    Device(DeviceFormInput),
    Declarant(DeclarantFormInput),
}

impl FormPayload {
    pub fn screen(&self) -> ScreenKind {
        match self {
            Self::Classification(_) => ScreenKind::Classification,
            Self::Subclass(_) => ScreenKind::Subclass,
            Self::SubclassRate(_) => ScreenKind::SubclassRate,
            Self::Barangay(_) => ScreenKind::Barangay,
            Self::Kind(_) => ScreenKind::Kind,
            Self::AssessmentLevel(_) => ScreenKind::AssessmentLevel,
            Self::Structure(_) => ScreenKind::Structure,
            Self::BuildingCode(_) => ScreenKind::BuildingCode,
            Self::BuildingComponent(_) => ScreenKind::BuildingComponent,
            Self::BuildingSubComponent(_) => ScreenKind::BuildingSubComponent,
            Self::LandAdjustment(_) => ScreenKind::LandAdjustment,
            Self::TaxRate(_) => ScreenKind::TaxRate,
            Self::Device(_) => ScreenKind::Device,
            Self::Declarant(_) => ScreenKind::Declarant,
        }
    }

    /// Blank form for a screen, pre-wired to the pane's parent scope.
    /// Users have no create form here; accounts register through the
    /// mobile client.
    pub fn blank_for(screen: ScreenKind, parent_key: Option<i64>) -> Option<Self> {
        let parent = parent_key.unwrap_or(0);
        match screen {
            ScreenKind::Classification => Some(Self::Classification(ClassificationFormInput {
                classification: String::new(),
            })),
            ScreenKind::Subclass => Some(Self::Subclass(SubclassFormInput {
                class_id: ClassificationId::new(parent),
                barangay_id: None,
                subclass: String::new(),
            })),
            ScreenKind::SubclassRate => Some(Self::SubclassRate(SubclassRateFormInput {
                subclass_id: SubclassId::new(parent),
                rate: 0.0,
                effective_year: String::new(),
            })),
            ScreenKind::Barangay => Some(Self::Barangay(BarangayFormInput {
                district_id: 1,
                barangay: String::new(),
            })),
            ScreenKind::Kind => Some(Self::Kind(KindFormInput {
                description: String::new(),
            })),
            ScreenKind::AssessmentLevel => Some(Self::AssessmentLevel(AssessmentLevelFormInput {
                kind_id: KindId::new(parent),
                class_id: None,
                effective_year: String::new(),
                range_low: 0.0,
                range_high: 0.0,
                rate_percent: 0.0,
            })),
            ScreenKind::Structure => Some(Self::Structure(StructureFormInput {
                structure_code: String::new(),
                description: String::new(),
                effective_date: None,
            })),
            ScreenKind::BuildingCode => Some(Self::BuildingCode(BuildingCodeFormInput {
                structure_id: StructureId::new(parent),
                building_code: String::new(),
                description: String::new(),
                rate: 0.0,
            })),
            ScreenKind::BuildingComponent => {
                Some(Self::BuildingComponent(BuildingComponentFormInput {
                    description: String::new(),
                }))
            }
            ScreenKind::BuildingSubComponent => {
                Some(Self::BuildingSubComponent(BuildingSubComponentFormInput {
                    building_com_id: BuildingComponentId::new(parent),
                    description: String::new(),
                    rate: 0.0,
                    percent: true,
                }))
            }
            ScreenKind::LandAdjustment => Some(Self::LandAdjustment(LandAdjustmentFormInput {
                description: String::new(),
                adjustment_factor: 0.0,
                adjustment_type: String::new(),
            })),
            ScreenKind::TaxRate => Some(Self::TaxRate(TaxRateFormInput {
                effective_year: String::new(),
                rate_percent: 0.0,
            })),
            ScreenKind::Device => Some(Self::Device(DeviceFormInput {
                user_id: UserId::new(parent),
                device_name: String::new(),
                registered: false,
            })),
            ScreenKind::Declarant => Some(Self::Declarant(DeclarantFormInput {
                declarant: String::new(),
                status: DeclarantStatus::Active,
            })),
            ScreenKind::User => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Classification(input) => input.validate(),
            Self::Subclass(input) => input.validate(),
            Self::SubclassRate(input) => input.validate(),
            Self::Barangay(input) => input.validate(),
            Self::Kind(input) => input.validate(),
            Self::AssessmentLevel(input) => input.validate(),
            Self::Structure(input) => input.validate(),
            Self::BuildingCode(input) => input.validate(),
            Self::BuildingComponent(input) => input.validate(),
            Self::BuildingSubComponent(input) => input.validate(),
            Self::LandAdjustment(input) => input.validate(),
            Self::TaxRate(input) => input.validate(),
            Self::Device(input) => input.validate(),
            Self::Declarant(input) => input.validate(),
        }
    }
}

fn validate_effective_year(year: &str, what: &str) -> Result<()> {
    let year = year.trim();
    if year.len() != 4 || !year.bytes().all(|byte| byte.is_ascii_digit()) {
        bail!("{what} effective year must be a 4-digit year, e.g. 2025");
    }
    Ok(())
}

fn validate_rate_percent(rate: f64, what: &str) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 || rate > 100.0 {
        bail!("{what} must be between 0 and 100");
    }
    Ok(())
}

impl ClassificationFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.classification.trim().is_empty() {
            bail!("classification name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl SubclassFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.class_id.get() <= 0 {
            bail!("subclass classification is required -- choose a classification and retry");
        }
        if self.subclass.trim().is_empty() {
            bail!("subclass name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl SubclassRateFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.subclass_id.get() <= 0 {
            bail!("rate subclass is required -- choose a subclass and retry");
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            bail!("rate cannot be negative");
        }
        validate_effective_year(&self.effective_year, "rate")
    }
}

impl BarangayFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.district_id <= 0 {
            bail!("barangay district is required -- choose a district and retry");
        }
        if self.barangay.trim().is_empty() {
            bail!("barangay name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl KindFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            bail!("kind description is required -- enter a description and retry");
        }
        Ok(())
    }
}

impl AssessmentLevelFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.kind_id.get() <= 0 {
            bail!("assessment level kind is required -- choose a kind and retry");
        }
        validate_effective_year(&self.effective_year, "assessment level")?;
        if !self.range_low.is_finite() || self.range_low < 0.0 {
            bail!("assessment level range start cannot be negative");
        }
        if !self.range_high.is_finite() || self.range_high < self.range_low {
            bail!("assessment level range end must be on/after range start");
        }
        validate_rate_percent(self.rate_percent, "assessment level rate")
    }
}

impl StructureFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.structure_code.trim().is_empty() {
            bail!("structure code is required -- enter a code and retry");
        }
        if self.description.trim().is_empty() {
            bail!("structure description is required -- enter a description and retry");
        }
        Ok(())
    }
}

impl BuildingCodeFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.structure_id.get() <= 0 {
            bail!("building code structure is required -- choose a structure and retry");
        }
        if self.building_code.trim().is_empty() {
            bail!("building code is required -- enter a code and retry");
        }
        if self.description.trim().is_empty() {
            bail!("building code description is required -- enter a description and retry");
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            bail!("building code rate cannot be negative");
        }
        Ok(())
    }
}

impl BuildingComponentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            bail!("component description is required -- enter a description and retry");
        }
        Ok(())
    }
}

impl BuildingSubComponentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.building_com_id.get() <= 0 {
            bail!("sub-component parent is required -- choose a component and retry");
        }
        if self.description.trim().is_empty() {
            bail!("sub-component description is required -- enter a description and retry");
        }
        if !self.rate.is_finite() || self.rate < 0.0 {
            bail!("sub-component rate cannot be negative");
        }
        if self.percent {
            validate_rate_percent(self.rate, "sub-component percentage rate")?;
        }
        Ok(())
    }
}

impl LandAdjustmentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            bail!("adjustment description is required -- enter a description and retry");
        }
        if !self.adjustment_factor.is_finite() || self.adjustment_factor <= 0.0 {
            bail!("adjustment factor must be positive");
        }
        if self.adjustment_type.trim().is_empty() {
            bail!("adjustment type is required -- enter a type and retry");
        }
        Ok(())
    }
}

impl TaxRateFormInput {
    pub fn validate(&self) -> Result<()> {
        validate_effective_year(&self.effective_year, "tax rate")?;
        validate_rate_percent(self.rate_percent, "tax rate")
    }
}

impl DeviceFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.get() <= 0 {
            bail!("device owner is required -- choose a user and retry");
        }
        if self.device_name.trim().is_empty() {
            bail!("device name is required -- enter a name and retry");
        }
        Ok(())
    }
}

impl DeclarantFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.declarant.trim().is_empty() {
            bail!("declarant name is required -- enter a name and retry");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_payload_is_available_for_every_screen_but_users() {
        for screen in [
            ScreenKind::Classification,
            ScreenKind::Subclass,
            ScreenKind::SubclassRate,
            ScreenKind::Barangay,
            ScreenKind::Kind,
            ScreenKind::AssessmentLevel,
            ScreenKind::Structure,
            ScreenKind::BuildingCode,
            ScreenKind::BuildingComponent,
            ScreenKind::BuildingSubComponent,
            ScreenKind::LandAdjustment,
            ScreenKind::TaxRate,
            ScreenKind::Device,
            ScreenKind::Declarant,
        ] {
            let payload = FormPayload::blank_for(screen, Some(5)).unwrap();
            assert_eq!(payload.screen(), screen);
        }
        assert!(FormPayload::blank_for(ScreenKind::User, None).is_none());
    }

    #[test]
    fn blank_scoped_form_carries_parent_key() {
        let FormPayload::Subclass(input) =
            FormPayload::blank_for(ScreenKind::Subclass, Some(7)).unwrap()
        else {
            panic!("expected a subclass form");
        };
        assert_eq!(input.class_id.get(), 7);
    }

    #[test]
    fn classification_validation_rejects_blank_name() {
        let input = ClassificationFormInput {
            classification: "   ".to_owned(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn effective_year_must_be_four_digits() {
        let mut input = TaxRateFormInput {
            effective_year: "2025".to_owned(),
            rate_percent: 2.0,
        };
        assert!(input.validate().is_ok());

        input.effective_year = "25".to_owned();
        assert!(input.validate().is_err());
        input.effective_year = "20a5".to_owned();
        assert!(input.validate().is_err());
    }

    #[test]
    fn assessment_level_rejects_inverted_range() {
        let input = AssessmentLevelFormInput {
            kind_id: KindId::new(2),
            class_id: None,
            effective_year: "2025".to_owned(),
            range_low: 175_000.0,
            range_high: 50_000.0,
            rate_percent: 10.0,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn percent_sub_component_rate_is_capped_at_100() {
        let mut input = BuildingSubComponentFormInput {
            building_com_id: BuildingComponentId::new(3),
            description: "Roofing".to_owned(),
            rate: 150.0,
            percent: true,
        };
        assert!(input.validate().is_err());

        input.percent = false;
        assert!(input.validate().is_ok());
    }

    #[test]
    fn land_adjustment_requires_positive_factor() {
        let input = LandAdjustmentFormInput {
            description: "Corner lot".to_owned(),
            adjustment_factor: 0.0,
            adjustment_type: "premium".to_owned(),
        };
        assert!(input.validate().is_err());
    }
}
