//! In-memory council backend state and its seed data.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Error;

pub type Db = Arc<RwLock<Store>>;

pub const RENTAL_STARTED_AT: &str = "2025-03-04T10:00:00";
pub const RENTAL_DUE_AT: &str = "2025-03-11T10:00:00";
pub const RETURNED_AT: &str = "2025-03-05T15:30:00";
pub const EMAIL_CODE: &str = "123456";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub student_id: String,
    pub name: String,
    pub role: String,
    pub fee_paid: bool,
    pub blacklist_until: Option<String>,
}

impl Member {
    pub fn is_council(&self) -> bool {
        matches!(self.role.as_str(), "COUNCIL" | "ADMIN" | "OWNER")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub total: i64,
    pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rental {
    pub id: i64,
    pub member_id: i64,
    pub category_id: i64,
    pub returned_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrGrant {
    Rent { member_id: i64, category_id: i64 },
    Return { rental_id: i64 },
    Fee { member_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locker {
    pub section: char,
    pub number: i64,
    pub holder: Option<i64>,
    pub broken: bool,
}

impl Locker {
    pub fn id(&self) -> i64 {
        (u32::from(self.section) - u32::from('A')) as i64 * 100 + self.number
    }
}

#[derive(Debug, Default)]
pub struct Store {
    pub members: BTreeMap<i64, Member>,
    pub sessions: HashMap<String, i64>,
    pub council: BTreeSet<i64>,
    pub categories: BTreeMap<i64, Category>,
    pub rentals: BTreeMap<i64, Rental>,
    pub grants: HashMap<String, QrGrant>,
    pub events: Vec<Event>,
    pub lockers: Vec<Locker>,
    next_id: i64,
}

impl Store {
    /// Four members (student, council, unpaid, blacklisted), three item
    /// categories, one event and a 9x4 locker grid.
    pub fn seeded() -> Self {
        let mut store = Store {
            next_id: 100,
            ..Store::default()
        };
        let members = [
            (1, "student@hby.test", "password1", "20201234", "김학생", "STUDENT", true, None),
            (2, "council@hby.test", "password2", "20190001", "이회장", "COUNCIL", true, None),
            (3, "unpaid@hby.test", "password3", "20221111", "박미납", "STUDENT", false, None),
            (4, "banned@hby.test", "password4", "20213333", "최정지", "STUDENT", true, Some("2025-12-31")),
        ];
        for (id, email, password, student_id, name, role, fee_paid, until) in members {
            store.members.insert(
                id,
                Member {
                    id,
                    email: email.to_string(),
                    password: password.to_string(),
                    student_id: student_id.to_string(),
                    name: name.to_string(),
                    role: role.to_string(),
                    fee_paid,
                    blacklist_until: until.map(str::to_string),
                },
            );
        }
        store.council.insert(2);

        for (id, name, total) in [(1, "우산", 3), (2, "충전기", 2), (3, "보조배터리", 0)] {
            store.categories.insert(
                id,
                Category {
                    id,
                    name: name.to_string(),
                    total,
                    available: total,
                },
            );
        }

        store.events.push(Event {
            id: 1,
            title: "개강총회".to_string(),
            content: "학생회관 2층".to_string(),
            start: "2025-03-04".to_string(),
            end: "2025-03-04".to_string(),
        });

        for section in 'A'..='I' {
            for number in 1..=4 {
                store.lockers.push(Locker {
                    section,
                    number,
                    holder: (section == 'A' && number == 1).then_some(1),
                    broken: section == 'I' && number == 4,
                });
            }
        }
        store
    }

    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn issue_grant(&mut self, grant: QrGrant) -> String {
        let token = Uuid::new_v4().to_string();
        self.grants.insert(token.clone(), grant);
        token
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(Member, String), Error> {
        let member = self
            .members
            .values()
            .find(|m| m.email == email && m.password == password)
            .cloned()
            .ok_or(Error::InvalidCredentials)?;
        let token = format!("at-{}", Uuid::new_v4());
        self.sessions.insert(token.clone(), member.id);
        Ok((member, token))
    }

    pub fn member_by_token(&self, token: Option<&str>) -> Result<&Member, Error> {
        token
            .and_then(|t| self.sessions.get(t))
            .and_then(|id| self.members.get(id))
            .ok_or(Error::NotLoggedIn)
    }

    pub fn council_by_token(&self, token: Option<&str>) -> Result<&Member, Error> {
        let member = self.member_by_token(token)?;
        if member.is_council() {
            Ok(member)
        } else {
            Err(Error::PermissionDenied)
        }
    }

    /// Check a rent grant against the rental rules and record the rental.
    pub fn rent(&mut self, qr_token: &str) -> Result<i64, Error> {
        let Some(QrGrant::Rent { member_id, category_id }) = self.grants.get(qr_token).copied() else {
            return Err(Error::BadRequest("유효하지 않은 QR 토큰입니다.".to_string()));
        };
        let member = self.members.get(&member_id).ok_or(Error::rental("MEMBER_NOT_FOUND"))?;
        if member.blacklist_until.is_some() {
            return Err(Error::rental("MEMBER_IS_BLACKLIST"));
        }
        if !member.fee_paid {
            return Err(Error::rental("MEMBER_NOT_PAID"));
        }
        let renting_same = self
            .rentals
            .values()
            .any(|r| r.member_id == member_id && r.category_id == category_id && r.returned_at.is_none());
        if renting_same {
            return Err(Error::rental("MEMBER_ALREADY_RENTED_SAME_CATEGORY"));
        }
        let category = self
            .categories
            .get_mut(&category_id)
            .ok_or(Error::rental("ITEM_CATEGORY_NOT_FOUND"))?;
        if category.available <= 0 {
            return Err(Error::rental("ITEM_QUANTITY_NON_POSITIVE"));
        }
        category.available -= 1;

        self.grants.remove(qr_token);
        let id = self.next_id();
        self.rentals.insert(
            id,
            Rental {
                id,
                member_id,
                category_id,
                returned_at: None,
            },
        );
        tracing::info!(rental_id = id, member_id, category_id, "item rented");
        Ok(id)
    }

    pub fn return_rental(&mut self, rental_id: i64) -> Result<(), Error> {
        let rental = self.rentals.get_mut(&rental_id).ok_or(Error::NotFound("대여 이력이 없습니다."))?;
        if rental.returned_at.is_some() {
            return Err(Error::rental("ALREADY_RETURN"));
        }
        rental.returned_at = Some(RETURNED_AT.to_string());
        if let Some(category) = self.categories.get_mut(&rental.category_id) {
            category.available = (category.available + 1).min(category.total);
        }
        tracing::info!(rental_id, "item returned");
        Ok(())
    }

    pub fn return_by_token(&mut self, qr_token: &str) -> Result<(), Error> {
        match self.grants.get(qr_token).copied() {
            Some(QrGrant::Return { rental_id }) => self.return_rental(rental_id),
            _ => Err(Error::BadRequest("유효하지 않은 QR 토큰입니다.".to_string())),
        }
    }
}
