/*
 * Responsibility
 * - city -> district -> ward selection state
 * - synchronous invalidation of dependent selections and option lists
 * - tickets that let late fetch completions be recognised and dropped
 */
use serde::Serialize;

use crate::form::model::{Region, RegionCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeLevel {
    District,
    Ward,
}

/// Issued when a parent selection needs its children fetched.
/// The result is only applied while the ticket is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeTicket {
    pub level: CascadeLevel,
    pub parent: RegionCode,
    seq: u64,
}

/// What a thin UI needs to render the three selects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionView {
    pub cities: Vec<Region>,
    pub districts: Vec<Region>,
    pub wards: Vec<Region>,
    pub selected_city: Option<RegionCode>,
    pub selected_district: Option<RegionCode>,
    /// Ward selections are held by name.
    pub selected_ward: Option<String>,
}

#[derive(Debug, Default)]
pub struct RegionCascade {
    view: RegionView,
    district_seq: u64,
    ward_seq: u64,
}

impl RegionCascade {
    pub fn view(&self) -> &RegionView {
        &self.view
    }

    pub fn set_cities(&mut self, cities: Vec<Region>) {
        self.view.cities = cities;
    }

    pub fn select_city(&mut self, code: Option<RegionCode>) -> Option<CascadeTicket> {
        self.view.selected_city = code;
        self.view.selected_district = None;
        self.view.selected_ward = None;
        self.view.districts.clear();
        self.view.wards.clear();

        // both child levels are now stale
        self.district_seq += 1;
        self.ward_seq += 1;

        code.map(|parent| CascadeTicket {
            level: CascadeLevel::District,
            parent,
            seq: self.district_seq,
        })
    }

    pub fn select_district(&mut self, code: Option<RegionCode>) -> Option<CascadeTicket> {
        self.view.selected_district = code;
        self.view.selected_ward = None;
        self.view.wards.clear();

        self.ward_seq += 1;

        code.map(|parent| CascadeTicket {
            level: CascadeLevel::Ward,
            parent,
            seq: self.ward_seq,
        })
    }

    pub fn select_ward(&mut self, name: Option<String>) {
        self.view.selected_ward = name.filter(|n| !n.is_empty());
    }

    pub fn is_current(&self, ticket: &CascadeTicket) -> bool {
        match ticket.level {
            CascadeLevel::District => {
                ticket.seq == self.district_seq
                    && self.view.selected_city == Some(ticket.parent)
            }
            CascadeLevel::Ward => {
                ticket.seq == self.ward_seq
                    && self.view.selected_district == Some(ticket.parent)
            }
        }
    }

    /// Applies a fetch result. Returns `false` when the ticket went stale.
    pub fn apply(&mut self, ticket: CascadeTicket, children: Vec<Region>) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!(
                level = ?ticket.level,
                parent = ticket.parent,
                "discarding stale region list"
            );
            return false;
        }
        match ticket.level {
            CascadeLevel::District => self.view.districts = children,
            CascadeLevel::Ward => self.view.wards = children,
        }
        true
    }

    pub fn city_name(&self) -> Option<String> {
        let code = self.view.selected_city?;
        find_by_code(&self.view.cities, code)
    }

    pub fn district_name(&self) -> Option<String> {
        let code = self.view.selected_district?;
        find_by_code(&self.view.districts, code)
    }

    /// Looks the selected ward up by *name*, unlike city and district which
    /// go by code. The ward select is keyed on names, so a code stored in
    /// `selected_ward` never resolves.
    pub fn ward_name(&self) -> Option<String> {
        let name = self.view.selected_ward.as_deref()?;
        self.view
            .wards
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.name.clone())
    }
}

fn find_by_code(list: &[Region], code: RegionCode) -> Option<String> {
    list.iter().find(|r| r.code == code).map(|r| r.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(code: RegionCode, name: &str) -> Region {
        Region {
            code,
            name: name.to_string(),
            codename: None,
            division_type: None,
        }
    }

    #[test]
    fn selecting_a_city_clears_dependents_synchronously() {
        let mut cascade = RegionCascade::default();
        let t = cascade.select_city(Some(1)).unwrap();
        cascade.apply(t, vec![region(10, "Ba Đình")]);
        let t = cascade.select_district(Some(10)).unwrap();
        cascade.apply(t, vec![region(100, "Phúc Xá")]);
        cascade.select_ward(Some("Phúc Xá".into()));

        cascade.select_city(Some(2));
        let view = cascade.view();
        assert_eq!(view.selected_city, Some(2));
        assert_eq!(view.selected_district, None);
        assert_eq!(view.selected_ward, None);
        assert!(view.districts.is_empty());
        assert!(view.wards.is_empty());
    }

    #[test]
    fn stale_district_list_is_discarded() {
        let mut cascade = RegionCascade::default();
        let for_a = cascade.select_city(Some(1)).unwrap();
        let for_b = cascade.select_city(Some(2)).unwrap();

        assert!(cascade.apply(for_b, vec![region(20, "B1")]));
        assert!(!cascade.apply(for_a, vec![region(10, "A1")]));
        assert_eq!(cascade.view().districts, vec![region(20, "B1")]);
    }

    #[test]
    fn reselecting_same_city_invalidates_older_ticket() {
        let mut cascade = RegionCascade::default();
        let first = cascade.select_city(Some(1)).unwrap();
        let second = cascade.select_city(Some(1)).unwrap();

        assert!(!cascade.is_current(&first));
        assert!(cascade.is_current(&second));
    }

    #[test]
    fn ward_ticket_goes_stale_when_city_changes() {
        let mut cascade = RegionCascade::default();
        let t = cascade.select_city(Some(1)).unwrap();
        cascade.apply(t, vec![region(10, "D")]);
        let ward_ticket = cascade.select_district(Some(10)).unwrap();

        cascade.select_city(Some(2));
        assert!(!cascade.apply(ward_ticket, vec![region(100, "W")]));
        assert!(cascade.view().wards.is_empty());
    }

    #[test]
    fn clearing_a_parent_issues_no_fetch() {
        let mut cascade = RegionCascade::default();
        assert!(cascade.select_city(None).is_none());
        assert!(cascade.select_district(None).is_none());
    }

    #[test]
    fn ward_resolves_by_name_only() {
        let mut cascade = RegionCascade::default();
        cascade.set_cities(vec![region(1, "Hà Nội")]);
        let t = cascade.select_city(Some(1)).unwrap();
        cascade.apply(t, vec![region(1, "Ba Đình")]);
        let t = cascade.select_district(Some(1)).unwrap();
        cascade.apply(t, vec![region(4, "Phúc Xá")]);

        cascade.select_ward(Some("Phúc Xá".into()));
        assert_eq!(cascade.city_name().as_deref(), Some("Hà Nội"));
        assert_eq!(cascade.district_name().as_deref(), Some("Ba Đình"));
        assert_eq!(cascade.ward_name().as_deref(), Some("Phúc Xá"));

        // a code in the ward slot does not resolve
        cascade.select_ward(Some("4".into()));
        assert_eq!(cascade.ward_name(), None);
    }
}
