// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Assessor,
    Encoder,
}

impl UserRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Assessor => "assessor",
            Self::Encoder => "encoder",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "assessor" => Some(Self::Assessor),
            "encoder" => Some(Self::Encoder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarantStatus {
    Active,
    Archived,
}

impl DeclarantStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub id: ClassificationId,
    pub classification: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subclass {
    pub id: SubclassId,
    pub class_id: ClassificationId,
    pub barangay_id: Option<BarangayId>,
    pub subclass: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubclassRate {
    pub id: SubclassRateId,
    pub subclass_id: SubclassId,
    pub rate: f64,
    pub effective_year: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barangay {
    pub id: BarangayId,
    pub district_id: i64,
    pub barangay: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kind {
    pub id: KindId,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentLevel {
    pub id: AssessmentLevelId,
    pub kind_id: KindId,
    pub class_id: Option<ClassificationId>,
    pub effective_year: String,
    pub range_low: f64,
    pub range_high: f64,
    pub rate_percent: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub structure_code: String,
    pub description: String,
    pub effective_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingCode {
    pub id: BuildingCodeId,
    pub structure_id: StructureId,
    pub building_code: String,
    pub description: String,
    pub rate: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingComponent {
    pub id: BuildingComponentId,
    pub description: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSubComponent {
    pub id: BuildingSubComponentId,
    pub building_com_id: BuildingComponentId,
    pub description: String,
    pub rate: f64,
    pub percent: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandAdjustment {
    pub id: LandAdjustmentId,
    pub description: String,
    pub adjustment_factor: f64,
    pub adjustment_type: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: TaxRateId,
    pub effective_year: String,
    pub rate_percent: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub suspended: bool,
    pub date_registered: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub user_id: UserId,
    pub device_name: String,
    pub registered: bool,
    pub registered_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarant {
    pub id: DeclarantId,
    pub declarant: String,
    pub status: DeclarantStatus,
    pub created_at: OffsetDateTime,
}

/// One fetched table row, across every screen. Mirrors the per-screen
/// entity structs so a single view-state type can serve all screens.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Classification(Classification),
    Subclass(Subclass),
    SubclassRate(SubclassRate),
    Barangay(Barangay),
    Kind(Kind),
    AssessmentLevel(AssessmentLevel),
    Structure(Structure),
    BuildingCode(BuildingCode),
    BuildingComponent(BuildingComponent),
    BuildingSubComponent(BuildingSubComponent),
    LandAdjustment(LandAdjustment),
    TaxRate(TaxRate),
    User(User),
    Device(Device),
    Declarant(Declarant),
}

impl Row {
    pub const fn screen(&self) -> ScreenKind {
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
            Self::User(_) => ScreenKind::User,
            Self::Device(_) => ScreenKind::Device,
            Self::Declarant(_) => ScreenKind::Declarant,
        }
    }

    pub const fn id(&self) -> i64 {
        match self {
            Self::Classification(row) => row.id.get(),
            Self::Subclass(row) => row.id.get(),
            Self::SubclassRate(row) => row.id.get(),
            Self::Barangay(row) => row.id.get(),
            Self::Kind(row) => row.id.get(),
            Self::AssessmentLevel(row) => row.id.get(),
            Self::Structure(row) => row.id.get(),
            Self::BuildingCode(row) => row.id.get(),
            Self::BuildingComponent(row) => row.id.get(),
            Self::BuildingSubComponent(row) => row.id.get(),
            Self::LandAdjustment(row) => row.id.get(),
            Self::TaxRate(row) => row.id.get(),
            Self::User(row) => row.id.get(),
            Self::Device(row) => row.id.get(),
            Self::Declarant(row) => row.id.get(),
        }
    }

    /// Short human label for confirmation dialogs and toasts.
    pub fn label(&self) -> String {
        match self {
            Self::Classification(row) => row.classification.clone(),
            Self::Subclass(row) => row.subclass.clone(),
            Self::SubclassRate(row) => format!("{} rate", row.effective_year),
            Self::Barangay(row) => row.barangay.clone(),
            Self::Kind(row) => row.description.clone(),
            Self::AssessmentLevel(row) => format!("{} level", row.effective_year),
            Self::Structure(row) => row.description.clone(),
            Self::BuildingCode(row) => row.building_code.clone(),
            Self::BuildingComponent(row) => row.description.clone(),
            Self::BuildingSubComponent(row) => row.description.clone(),
            Self::LandAdjustment(row) => row.description.clone(),
            Self::TaxRate(row) => format!("{} tax rate", row.effective_year),
            Self::User(row) => row.username.clone(),
            Self::Device(row) => row.device_name.clone(),
            Self::Declarant(row) => row.declarant.clone(),
        }
    }

    /// The fixed set of displayable fields the search box matches against,
    /// coerced to strings. Boolean flags match their domain words, not
    /// "true"/"false": a sub-component's percent flag matches
    /// "percent"/"fixed", a device's registration matches
    /// "registered"/"pending".
    pub fn haystack(&self) -> Vec<String> {
        match self {
            Self::Classification(row) => vec![row.classification.clone()],
            Self::Subclass(row) => vec![row.subclass.clone()],
            Self::SubclassRate(row) => {
                vec![row.effective_year.clone(), row.rate.to_string()]
            }
            Self::Barangay(row) => vec![row.barangay.clone()],
            Self::Kind(row) => vec![row.description.clone()],
            Self::AssessmentLevel(row) => vec![
                row.effective_year.clone(),
                row.range_low.to_string(),
                row.range_high.to_string(),
                row.rate_percent.to_string(),
            ],
            Self::Structure(row) => {
                vec![row.structure_code.clone(), row.description.clone()]
            }
            Self::BuildingCode(row) => vec![
                row.building_code.clone(),
                row.description.clone(),
                row.rate.to_string(),
            ],
            Self::BuildingComponent(row) => vec![row.description.clone()],
            Self::BuildingSubComponent(row) => vec![
                row.description.clone(),
                row.rate.to_string(),
                if row.percent { "percent" } else { "fixed" }.to_owned(),
            ],
            Self::LandAdjustment(row) => vec![
                row.description.clone(),
                row.adjustment_factor.to_string(),
                row.adjustment_type.clone(),
            ],
            Self::TaxRate(row) => {
                vec![row.effective_year.clone(), row.rate_percent.to_string()]
            }
            Self::User(row) => vec![
                row.username.clone(),
                row.email.clone(),
                row.first_name.clone(),
                row.last_name.clone(),
                row.role.as_str().to_owned(),
            ],
            Self::Device(row) => vec![
                row.device_name.clone(),
                if row.registered { "registered" } else { "pending" }.to_owned(),
            ],
            Self::Declarant(row) => {
                vec![row.declarant.clone(), row.status.as_str().to_owned()]
            }
        }
    }
}

/// Case-insensitive substring filter over a screen's rows. An empty (or
/// all-whitespace) term is the identity; otherwise the result is the
/// subsequence of rows whose haystack contains the lowered term, in the
/// original order.
pub fn filter_rows<'a>(items: &'a [Row], search_term: &str) -> Vec<&'a Row> {
    let term = search_term.trim().to_lowercase();
    if term.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|row| {
            row.haystack()
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenKind {
    Classification,
    Subclass,
    SubclassRate,
    Barangay,
    Kind,
    AssessmentLevel,
    Structure,
    BuildingCode,
    BuildingComponent,
    BuildingSubComponent,
    LandAdjustment,
    TaxRate,
    User,
    Device,
    Declarant,
}

impl ScreenKind {
    /// Screens reachable from the top-level menu; the rest are drill-down
    /// targets only.
    pub const MENU: [Self; 8] = [
        Self::Classification,
        Self::Kind,
        Self::Barangay,
        Self::Structure,
        Self::BuildingComponent,
        Self::TaxRate,
        Self::User,
        Self::Declarant,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Classification => "classifications",
            Self::Subclass => "subclasses",
            Self::SubclassRate => "subclass rates",
            Self::Barangay => "barangays",
            Self::Kind => "kinds",
            Self::AssessmentLevel => "assessment levels",
            Self::Structure => "structures",
            Self::BuildingCode => "building codes",
            Self::BuildingComponent => "building components",
            Self::BuildingSubComponent => "building sub-components",
            Self::LandAdjustment => "land adjustments",
            Self::TaxRate => "tax rates",
            Self::User => "users",
            Self::Device => "devices",
            Self::Declarant => "declarants",
        }
    }

    /// Query-string parameter naming the parent key, for screens scoped to
    /// a parent. `None` for flat reference tables, which fetch
    /// unconditionally.
    pub const fn parent_param(self) -> Option<&'static str> {
        match self {
            Self::Subclass => Some("class_id"),
            Self::SubclassRate => Some("subclass_id"),
            Self::Barangay => Some("district_id"),
            Self::AssessmentLevel => Some("kind_id"),
            Self::BuildingCode => Some("structure_id"),
            Self::BuildingSubComponent => Some("building_com_id"),
            Self::Device => Some("user_id"),
            Self::Classification
            | Self::Kind
            | Self::Structure
            | Self::BuildingComponent
            | Self::LandAdjustment
            | Self::TaxRate
            | Self::User
            | Self::Declarant => None,
        }
    }

    pub const fn is_scoped(self) -> bool {
        self.parent_param().is_some()
    }

    /// Toolbar actions in display order. Mirrors the per-screen icon rows
    /// of the original console: create is always enabled, everything else
    /// requires a selected row, and some drill-downs additionally gate on a
    /// field of the selected row.
    pub const fn actions(self) -> &'static [ActionSpec] {
        // Each arm's table lives in a const item so the returned slice is
        // promoted to 'static.
        match self {
            Self::Classification => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add classification"),
                    ActionSpec::edit("edit classification"),
                    ActionSpec::delete_guarded("delete classification"),
                    ActionSpec::drill("manage subclasses", ScreenKind::Subclass),
                ];
                ACTIONS
            }
            Self::Subclass => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add subclass"),
                    ActionSpec::edit("edit subclass"),
                    ActionSpec::delete("delete subclass"),
                    ActionSpec::drill("manage rates", ScreenKind::SubclassRate),
                ];
                ACTIONS
            }
            Self::SubclassRate => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add rate"),
                    ActionSpec::edit("edit rate"),
                    ActionSpec::delete("delete rate"),
                ];
                ACTIONS
            }
            Self::Barangay => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add barangay"),
                    ActionSpec::edit("edit barangay"),
                    ActionSpec::delete("delete barangay"),
                ];
                ACTIONS
            }
            Self::Kind => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add kind"),
                    ActionSpec::edit("edit kind"),
                    ActionSpec::delete("delete kind"),
                    ActionSpec::drill("assessment levels", ScreenKind::AssessmentLevel),
                    ActionSpec::drill_if(
                        "manage structures",
                        ScreenKind::Structure,
                        RowPredicate::KindDescriptionIs("BUILDING"),
                    ),
                    ActionSpec::drill_if(
                        "land adjustments",
                        ScreenKind::LandAdjustment,
                        RowPredicate::KindDescriptionIs("LAND"),
                    ),
                ];
                ACTIONS
            }
            Self::AssessmentLevel => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add level"),
                    ActionSpec::edit("edit level"),
                    ActionSpec::delete("delete level"),
                ];
                ACTIONS
            }
            Self::Structure => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add structure"),
                    ActionSpec::edit("edit structure"),
                    ActionSpec::delete("delete structure"),
                    ActionSpec::drill("building codes", ScreenKind::BuildingCode),
                ];
                ACTIONS
            }
            Self::BuildingCode => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add building code"),
                    ActionSpec::edit("edit building code"),
                    ActionSpec::delete("delete building code"),
                    ActionSpec::drill("components", ScreenKind::BuildingComponent),
                ];
                ACTIONS
            }
            Self::BuildingComponent => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add component"),
                    ActionSpec::edit("edit component"),
                    ActionSpec::delete("delete component"),
                    ActionSpec::drill("sub-components", ScreenKind::BuildingSubComponent),
                ];
                ACTIONS
            }
            Self::BuildingSubComponent => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add sub-component"),
                    ActionSpec::edit("edit sub-component"),
                    ActionSpec::delete("delete sub-component"),
                ];
                ACTIONS
            }
            Self::LandAdjustment => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add adjustment"),
                    ActionSpec::edit("edit adjustment"),
                    ActionSpec::delete("delete adjustment"),
                ];
                ACTIONS
            }
            Self::TaxRate => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add tax rate"),
                    ActionSpec::edit("edit tax rate"),
                    ActionSpec::delete("delete tax rate"),
                ];
                ACTIONS
            }
            Self::User => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::suspend("suspend / unsuspend"),
                    ActionSpec::delete("delete user"),
                    ActionSpec::drill("manage devices", ScreenKind::Device),
                ];
                ACTIONS
            }
            Self::Device => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add device"),
                    ActionSpec::edit("edit device"),
                    ActionSpec::delete("delete device"),
                ];
                ACTIONS
            }
            Self::Declarant => {
                const ACTIONS: &[ActionSpec] = &[
                    ActionSpec::create("add declarant"),
                    ActionSpec::edit("edit declarant"),
                    ActionSpec::delete("delete declarant"),
                ];
                ACTIONS
            }
        }
    }

    /// Child table consulted before delete is offered (classifications must
    /// not be deleted while subclasses still reference them).
    pub const fn delete_dependent(self) -> Option<Self> {
        match self {
            Self::Classification => Some(Self::Subclass),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Create,
    Edit,
    Delete,
    Suspend,
    Drill(ScreenKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPredicate {
    KindDescriptionIs(&'static str),
}

impl RowPredicate {
    pub fn holds(self, row: &Row) -> bool {
        match self {
            Self::KindDescriptionIs(expected) => match row {
                Row::Kind(kind) => kind.description.eq_ignore_ascii_case(expected),
                _ => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enablement {
    Always,
    RowSelected,
    RowSelectedWhere(RowPredicate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub label: &'static str,
    pub enabled_when: Enablement,
    /// Whether a dependent-count check must pass before the delete
    /// confirmation may open.
    pub usage_guarded: bool,
}

impl ActionSpec {
    pub const fn create(label: &'static str) -> Self {
        Self {
            kind: ActionKind::Create,
            label,
            enabled_when: Enablement::Always,
            usage_guarded: false,
        }
    }

    pub const fn edit(label: &'static str) -> Self {
        Self {
            kind: ActionKind::Edit,
            label,
            enabled_when: Enablement::RowSelected,
            usage_guarded: false,
        }
    }

    pub const fn delete(label: &'static str) -> Self {
        Self {
            kind: ActionKind::Delete,
            label,
            enabled_when: Enablement::RowSelected,
            usage_guarded: false,
        }
    }

    pub const fn delete_guarded(label: &'static str) -> Self {
        Self {
            kind: ActionKind::Delete,
            label,
            enabled_when: Enablement::RowSelected,
            usage_guarded: true,
        }
    }

    pub const fn suspend(label: &'static str) -> Self {
        Self {
            kind: ActionKind::Suspend,
            label,
            enabled_when: Enablement::RowSelected,
            usage_guarded: false,
        }
    }

    pub const fn drill(label: &'static str, target: ScreenKind) -> Self {
        Self {
            kind: ActionKind::Drill(target),
            label,
            enabled_when: Enablement::RowSelected,
            usage_guarded: false,
        }
    }

    pub const fn drill_if(
        label: &'static str,
        target: ScreenKind,
        predicate: RowPredicate,
    ) -> Self {
        Self {
            kind: ActionKind::Drill(target),
            label,
            enabled_when: Enablement::RowSelectedWhere(predicate),
            usage_guarded: false,
        }
    }

    pub fn is_enabled(&self, selected: Option<&Row>) -> bool {
        match self.enabled_when {
            Enablement::Always => true,
            Enablement::RowSelected => selected.is_some(),
            Enablement::RowSelectedWhere(predicate) => {
                selected.is_some_and(|row| predicate.holds(row))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn kind(description: &str) -> Row {
        Row::Kind(Kind {
            id: KindId::new(1),
            description: description.to_owned(),
            created_at: datetime!(2025-06-01 00:00:00 UTC),
        })
    }

    fn subcomponent(description: &str, percent: bool) -> Row {
        Row::BuildingSubComponent(BuildingSubComponent {
            id: BuildingSubComponentId::new(1),
            building_com_id: BuildingComponentId::new(4),
            description: description.to_owned(),
            rate: 12.5,
            percent,
            created_at: datetime!(2025-06-01 00:00:00 UTC),
        })
    }

    #[test]
    fn empty_search_term_is_identity() {
        let items = vec![kind("LAND"), kind("BUILDING")];
        let filtered = filter_rows(&items, "   ");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0], &items[0]);
        assert_eq!(filtered[1], &items[1]);
    }

    #[test]
    fn filter_is_case_insensitive_and_order_preserving() {
        let items = vec![kind("LAND"), kind("BUILDING"), kind("LANDMARK")];
        let lower = filter_rows(&items, "land");
        let upper = filter_rows(&items, "LAND");
        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 2);
        assert_eq!(lower[0], &items[0]);
        assert_eq!(lower[1], &items[2]);
    }

    #[test]
    fn percent_flag_matches_domain_words_not_booleans() {
        let items = vec![subcomponent("Roofing", true), subcomponent("Flooring", false)];
        assert_eq!(filter_rows(&items, "percent").len(), 1);
        assert_eq!(filter_rows(&items, "fixed").len(), 1);
        assert!(filter_rows(&items, "true").is_empty());
        assert!(filter_rows(&items, "false").is_empty());
    }

    #[test]
    fn building_drill_enabled_only_for_building_kind() {
        let drill = ScreenKind::Kind
            .actions()
            .iter()
            .find(|action| action.kind == ActionKind::Drill(ScreenKind::Structure))
            .expect("kind screen offers structure drill");

        assert!(drill.is_enabled(Some(&kind("BUILDING"))));
        assert!(drill.is_enabled(Some(&kind("building"))));
        assert!(!drill.is_enabled(Some(&kind("LAND"))));
        assert!(!drill.is_enabled(None));
    }

    #[test]
    fn action_tables_are_static_and_populated_for_every_screen() {
        let screens = [
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
            ScreenKind::User,
            ScreenKind::Device,
            ScreenKind::Declarant,
        ];
        // The borrows must outlive the calls that produced them.
        let tables: Vec<&'static [ActionSpec]> =
            screens.iter().map(|screen| screen.actions()).collect();
        for (screen, table) in screens.iter().zip(&tables) {
            assert!(!table.is_empty(), "{}", screen.label());
            let expected_first = if *screen == ScreenKind::User {
                ActionKind::Suspend
            } else {
                ActionKind::Create
            };
            assert_eq!(table[0].kind, expected_first, "{}", screen.label());
        }
    }

    #[test]
    fn create_is_enabled_without_selection_on_every_screen() {
        for screen in ScreenKind::MENU {
            for action in screen.actions() {
                if action.kind == ActionKind::Create {
                    assert!(action.is_enabled(None), "{}", screen.label());
                }
            }
        }
    }

    #[test]
    fn scoped_screens_declare_a_parent_param() {
        assert_eq!(ScreenKind::Subclass.parent_param(), Some("class_id"));
        assert_eq!(ScreenKind::AssessmentLevel.parent_param(), Some("kind_id"));
        assert_eq!(ScreenKind::Classification.parent_param(), None);
        assert!(ScreenKind::Device.is_scoped());
        assert!(!ScreenKind::TaxRate.is_scoped());
    }

    #[test]
    fn only_classification_delete_is_usage_guarded() {
        for screen in [
            ScreenKind::Classification,
            ScreenKind::Subclass,
            ScreenKind::Kind,
            ScreenKind::User,
        ] {
            let guarded = screen
                .actions()
                .iter()
                .any(|action| action.kind == ActionKind::Delete && action.usage_guarded);
            assert_eq!(guarded, screen == ScreenKind::Classification);
        }
        assert_eq!(
            ScreenKind::Classification.delete_dependent(),
            Some(ScreenKind::Subclass)
        );
    }
}
