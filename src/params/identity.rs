// Keyforge - Random Identities
//
// Produces plausible en_US subject data for throwaway signing keys, so that
// generated certificates do not all carry the same placeholder owner.

use rand::seq::IndexedRandom;
use rand::Rng;

use super::Subject;

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
    "Sarah", "Christopher", "Karen", "Daniel", "Lisa", "Matthew", "Nancy", "Anthony", "Betty",
    "Mark", "Sandra", "Steven", "Ashley", "Andrew", "Emily", "Joshua", "Michelle", "Kevin",
    "Amanda", "Brian", "Melissa", "Ryan", "Stephanie", "Jason", "Angela", "Eric", "Rebecca",
    "Jacob", "Laura", "Gary", "Amy", "Nicholas", "Shirley", "Jonathan", "Anna", "Justin",
    "Brenda", "Scott", "Pamela", "Brandon", "Nicole", "Benjamin", "Samantha", "Samuel",
    "Katherine", "Gregory", "Christine", "Alexander", "Debra", "Patrick", "Rachel", "Frank",
    "Carolyn", "Raymond", "Janet", "Jack", "Maria", "Dennis", "Heather", "Tyler", "Diane",
    "Aaron", "Julie", "Ethan", "Olivia", "Adam", "Victoria", "Nathan", "Kelly", "Henry", "Lauren",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore",
    "Jackson", "Martin", "Lee", "Thompson", "White", "Harris", "Clark", "Lewis", "Robinson",
    "Walker", "Young", "Allen", "King", "Wright", "Scott", "Hill", "Green", "Adams", "Baker",
    "Nelson", "Carter", "Mitchell", "Roberts", "Gonzalez", "Perez", "Sanchez", "Ramirez",
    "Torres", "Nguyen", "Flores", "Rivera", "Campbell", "Parker", "Evans", "Edwards", "Collins",
    "Stewart", "Morris", "Murphy", "Cook", "Rogers", "Morgan", "Peterson", "Cooper", "Reed",
    "Bailey", "Bell", "Gomez", "Kelly", "Howard", "Ward", "Cox", "Diaz", "Richardson", "Wood",
    "Watson", "Brooks", "Bennett", "Gray", "James", "Reyes", "Cruz", "Hughes", "Price", "Myers",
    "Long", "Foster", "Sanders", "Ross", "Morales", "Powell", "Sullivan", "Russell", "Ortiz",
];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "PLC", "Ltd", "and Sons", "Corp"];

const JOB_TITLES: &[&str] = &[
    "Software engineer", "Data scientist", "Product manager", "Systems analyst",
    "Quality assurance tester", "Network engineer", "Technical writer", "UX designer",
    "Database administrator", "Web developer", "Security consultant", "Mobile developer",
    "IT support specialist", "Project manager", "Research scientist", "Operations manager",
    "Accountant", "Financial analyst", "Civil engineer", "Graphic designer", "Architect",
    "Marketing executive", "Sales representative", "Hydrologist", "Pharmacist", "Librarian",
    "Translator", "Surveyor", "Editor", "Statistician", "Economist", "Logistics coordinator",
];

// Real US place names only.
const CITIES: &[&str] = &[
    "Springfield", "Riverside", "Fairview", "Madison", "Georgetown", "Franklin", "Greenville",
    "Clinton", "Salem", "Bristol", "Oakland", "Austin", "Portland", "Denver", "Columbus",
    "Raleigh", "Boise", "Tucson", "Omaha", "Richmond", "Albuquerque", "Anchorage", "Atlanta",
    "Baltimore", "Birmingham", "Boston", "Buffalo", "Charlotte", "Chicago", "Cincinnati",
    "Cleveland", "Dallas", "Des Moines", "Detroit", "El Paso", "Fort Worth", "Fresno",
    "Honolulu", "Houston", "Indianapolis", "Jacksonville", "Kansas City", "Las Vegas",
    "Lexington", "Lincoln", "Little Rock", "Los Angeles", "Louisville", "Memphis", "Miami",
    "Milwaukee", "Minneapolis", "Nashville", "New Orleans", "Oklahoma City", "Orlando",
    "Philadelphia", "Phoenix", "Pittsburgh", "Sacramento", "Salt Lake City", "San Antonio",
    "San Diego", "San Jose", "Seattle", "Spokane", "St. Louis", "Tampa", "Tulsa", "Wichita",
];

const STATES: &[&str] = &[
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
    "Wisconsin", "Wyoming",
];

const COUNTRY_CODES: &[&str] = &[
    "US", "CA", "GB", "IE", "AU", "NZ", "DE", "FR", "NL", "BE", "SE", "NO", "DK", "FI", "ES",
    "PT", "IT", "CH", "AT", "PL", "CZ", "JP", "KR", "SG", "IN", "BR", "MX", "AR", "ZA", "IL",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn company<R: Rng + ?Sized>(rng: &mut R) -> String {
    match rng.random_range(0..3) {
        0 => format!("{} {}", pick(rng, LAST_NAMES), pick(rng, COMPANY_SUFFIXES)),
        1 => format!("{}-{}", pick(rng, LAST_NAMES), pick(rng, LAST_NAMES)),
        _ => format!(
            "{}, {} and {}",
            pick(rng, LAST_NAMES),
            pick(rng, LAST_NAMES),
            pick(rng, LAST_NAMES)
        ),
    }
}

/// Draw a random subject.
pub fn random_subject<R: Rng + ?Sized>(rng: &mut R) -> Subject {
    Subject {
        first_name: pick(rng, FIRST_NAMES).to_string(),
        last_name: pick(rng, LAST_NAMES).to_string(),
        organization_unit: pick(rng, JOB_TITLES).to_string(),
        organization: company(rng),
        city: pick(rng, CITIES).to_string(),
        state: pick(rng, STATES).to_string(),
        country_code: pick(rng, COUNTRY_CODES).to_string(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
