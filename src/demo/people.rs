//! People and employers records, their resources, and the backing store

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper::body::Bytes;
use hyper::Request;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{canned_body, canned_override, reference_time, CANNED_TYPE};
use crate::error::RestError;
use crate::http::accept::Accept;
use crate::http::body::to_json;
use crate::http::range::{ContentRange, Range};
use crate::resource::{Cacheable, Rangeable, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    pub company: String,
    pub continent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: String,
    pub age: u32,
    #[serde(rename = "eyeColor")]
    pub eye_color: String,
    pub firstname: String,
    pub lastname: String,
    pub employer: Employer,
}

impl Resource for Person {
    fn select_media_type(&self, accept: &Accept) -> Option<&str> {
        canned_override(accept)
    }

    fn marshal(&self, media_type: &str, _req: &Request<Bytes>) -> Result<Bytes, RestError> {
        if media_type == CANNED_TYPE {
            return Ok(canned_body());
        }
        to_json(self)
    }

    fn as_cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }
}

impl Cacheable for Person {
    fn etag(&self) -> String {
        format!("{}-{}", self.id, self.last_modified().timestamp())
    }

    fn last_modified(&self) -> DateTime<Utc> {
        reference_time()
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(30)
    }
}

impl Resource for Employer {
    fn select_media_type(&self, accept: &Accept) -> Option<&str> {
        canned_override(accept)
    }

    fn marshal(&self, media_type: &str, _req: &Request<Bytes>) -> Result<Bytes, RestError> {
        if media_type == CANNED_TYPE {
            return Ok(canned_body());
        }
        to_json(self)
    }

    fn as_cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }
}

impl Cacheable for Employer {
    fn etag(&self) -> String {
        format!("{}-{}", self.company, self.last_modified().timestamp())
    }

    fn last_modified(&self) -> DateTime<Utc> {
        reference_time()
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(15 * 60)
    }
}

/// Ordered list of records, rangeable in `items`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Collection<T> {
    pub const fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T> Resource for Collection<T>
where
    T: Cacheable + Serialize + Clone + 'static,
{
    fn select_media_type(&self, accept: &Accept) -> Option<&str> {
        canned_override(accept)
    }

    fn marshal(&self, media_type: &str, _req: &Request<Bytes>) -> Result<Bytes, RestError> {
        if media_type == CANNED_TYPE {
            return Ok(canned_body());
        }
        to_json(&self.items)
    }

    fn as_cacheable(&self) -> Option<&dyn Cacheable> {
        Some(self)
    }

    fn as_rangeable(&self) -> Option<&dyn Rangeable> {
        Some(self)
    }
}

impl<T: Cacheable> Cacheable for Collection<T> {
    /// Tag of the first element; an empty collection has none
    fn etag(&self) -> String {
        self.items.first().map(Cacheable::etag).unwrap_or_default()
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.items
            .iter()
            .map(Cacheable::last_modified)
            .max()
            .unwrap_or_else(reference_time)
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(15)
    }
}

impl<T> Rangeable for Collection<T>
where
    T: Cacheable + Serialize + Clone + 'static,
{
    fn count(&self) -> u64 {
        self.items.len() as u64
    }

    fn range(&self, range: &Range) -> Result<(ContentRange, Box<dyn Resource>), RestError> {
        let from = usize::try_from(range.from).map_err(RestError::internal)?;
        let to = usize::try_from(range.to).map_err(RestError::internal)?;
        let slice = self
            .items
            .get(from..=to)
            .ok_or_else(|| RestError::RangeNotSatisfiable {
                unit: range.unit.clone(),
                count: self.count(),
            })?;

        let content_range = ContentRange {
            range: range.clone(),
            count: self.count(),
        };
        Ok((content_range, Box::new(Self::new(slice.to_vec()))))
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixtures: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid fixtures: {0}")]
    Json(#[from] serde_json::Error),
}

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Ken", "Radia", "Donald",
];
const LAST_NAMES: [&str; 8] = [
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Thompson", "Perlman", "Knuth",
];
const EYE_COLORS: [&str; 3] = ["brown", "blue", "green"];
const COMPANIES: [(&str, &str); 6] = [
    ("Zentix", "Europe"),
    ("Quilch", "Asia"),
    ("Ecosys", "Africa"),
    ("Orbaxter", "North America"),
    ("Plasmox", "South America"),
    ("Terrago", "Oceania"),
];

/// Seed of the generated demo records
const SEED: u64 = 0x5eed_f00d_cafe_0001;

/// In-memory people records shared by the demo endpoints
#[derive(Debug, Default)]
pub struct PeopleStore {
    people: RwLock<Vec<Person>>,
}

impl PeopleStore {
    pub const fn new(people: Vec<Person>) -> Self {
        Self {
            people: RwLock::new(people),
        }
    }

    /// Deterministic records; ids are 24 hex digits
    pub fn seed(count: usize) -> Self {
        let mut rng = fastrand::Rng::with_seed(SEED);

        let people = (0..count)
            .map(|i| {
                let (company, continent) = COMPANIES[i % COMPANIES.len()];
                Person {
                    id: format!("{:016x}{:08x}", rng.u64(..), i),
                    age: rng.u32(20..65),
                    eye_color: rng.choice(EYE_COLORS).unwrap_or_default().to_string(),
                    firstname: rng.choice(FIRST_NAMES).unwrap_or_default().to_string(),
                    lastname: rng.choice(LAST_NAMES).unwrap_or_default().to_string(),
                    employer: Employer {
                        company: company.to_string(),
                        continent: continent.to_string(),
                    },
                }
            })
            .collect();
        Self::new(people)
    }

    /// Load a JSON array of people
    pub fn from_json_file(path: &str) -> Result<Self, FixtureError> {
        let raw = std::fs::read(path)?;
        Ok(Self::new(serde_json::from_slice(&raw)?))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Person>>, RestError> {
        self.people
            .read()
            .map_err(|_| RestError::internal("people store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Person>>, RestError> {
        self.people
            .write()
            .map_err(|_| RestError::internal("people store lock poisoned"))
    }

    pub fn all(&self) -> Result<Vec<Person>, RestError> {
        Ok(self.read()?.clone())
    }

    pub fn first(&self) -> Result<Option<Person>, RestError> {
        Ok(self.read()?.first().cloned())
    }

    pub fn find(&self, id: &str) -> Result<Option<Person>, RestError> {
        Ok(self.read()?.iter().find(|p| p.id == id).cloned())
    }

    /// Add a person; an existing id is a bad request
    pub fn insert(&self, person: Person) -> Result<(), RestError> {
        let mut people = self.write()?;
        if people.iter().any(|p| p.id == person.id) {
            return Err(RestError::BadRequest(format!(
                "person {} already exists",
                person.id
            )));
        }
        people.push(person);
        Ok(())
    }

    /// Remove by id, reporting whether anything was removed
    pub fn remove(&self, id: &str) -> Result<bool, RestError> {
        let mut people = self.write()?;
        let before = people.len();
        people.retain(|p| p.id != id);
        Ok(people.len() != before)
    }

    /// Distinct employers in order of first appearance
    pub fn employers(&self) -> Result<Vec<Employer>, RestError> {
        let mut employers: Vec<Employer> = Vec::new();
        for person in self.read()?.iter() {
            if !employers.iter().any(|e| e.company == person.employer.company) {
                employers.push(person.employer.clone());
            }
        }
        Ok(employers)
    }

    /// Employer by company name, ignoring case
    pub fn employer(&self, name: &str) -> Result<Option<Employer>, RestError> {
        Ok(self
            .read()?
            .iter()
            .map(|p| &p.employer)
            .find(|e| e.company.eq_ignore_ascii_case(name))
            .cloned())
    }

    pub fn len(&self) -> Result<usize, RestError> {
        Ok(self.read()?.len())
    }
}
