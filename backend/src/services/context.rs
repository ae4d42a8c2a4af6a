//! Location context derivation
//!
//! Pure functions over a location, its current snapshot, an optional
//! forecast and the wall clock. Unknown places get a generic profile.

use chrono::{DateTime, Datelike, Local, Utc};
use chrono_tz::Tz;
use shared::{location_key, ForecastSnapshot, LocationContext, WeatherSnapshot};

const MAX_ACTIVITIES: usize = 6;
const MAX_TIPS: usize = 4;

/// Static facts for a well-known city
struct CityProfile {
    key: &'static str,
    timezone: Tz,
    southern: bool,
    facts: &'static [&'static str],
    activities: &'static [&'static str],
}

static CITY_PROFILES: &[CityProfile] = &[
    CityProfile {
        key: "new york",
        timezone: chrono_tz::America::New_York,
        southern: false,
        facts: &[
            "New York City is made up of five boroughs",
            "Central Park covers 843 acres in the middle of Manhattan",
        ],
        activities: &["Walk the High Line", "Visit the Metropolitan Museum of Art", "Catch a Broadway show"],
    },
    CityProfile {
        key: "london",
        timezone: chrono_tz::Europe::London,
        southern: false,
        facts: &[
            "London's Underground is the oldest metro system in the world",
            "The city has more than 170 museums",
        ],
        activities: &["Stroll along the South Bank", "Tour the British Museum", "Explore Borough Market"],
    },
    CityProfile {
        key: "paris",
        timezone: chrono_tz::Europe::Paris,
        southern: false,
        facts: &[
            "The Eiffel Tower was built for the 1889 World's Fair",
            "The Louvre is the most visited art museum in the world",
        ],
        activities: &["Cruise the Seine", "Visit the Louvre", "Wander through Montmartre"],
    },
    CityProfile {
        key: "tokyo",
        timezone: chrono_tz::Asia::Tokyo,
        southern: false,
        facts: &[
            "Greater Tokyo is the most populous metropolitan area in the world",
            "Shibuya Crossing is one of the busiest pedestrian crossings anywhere",
        ],
        activities: &["Visit Senso-ji temple", "Explore the Tsukiji outer market", "Relax in Shinjuku Gyoen"],
    },
    CityProfile {
        key: "sydney",
        timezone: chrono_tz::Australia::Sydney,
        southern: true,
        facts: &[
            "The Sydney Opera House opened in 1973",
            "Sydney Harbour is one of the largest natural harbours in the world",
        ],
        activities: &["Walk from Bondi to Coogee", "Take the ferry to Manly", "Tour the Opera House"],
    },
    CityProfile {
        key: "los angeles",
        timezone: chrono_tz::America::Los_Angeles,
        southern: false,
        facts: &[
            "Los Angeles averages over 280 sunny days a year",
            "Hollywood has been the heart of the film industry since the 1910s",
        ],
        activities: &["Visit the Griffith Observatory", "Spend an afternoon in Santa Monica", "Tour the Getty Center"],
    },
    CityProfile {
        key: "chicago",
        timezone: chrono_tz::America::Chicago,
        southern: false,
        facts: &[
            "Chicago is home to the first skyscraper, built in 1885",
            "The Chicago River is dyed green every St. Patrick's Day",
        ],
        activities: &["Take an architecture boat tour", "Visit Millennium Park", "Explore the Art Institute"],
    },
    CityProfile {
        key: "toronto",
        timezone: chrono_tz::America::Toronto,
        southern: false,
        facts: &[
            "The CN Tower stands 553 metres tall",
            "More than half of Toronto's residents were born outside Canada",
        ],
        activities: &["Ride up the CN Tower", "Explore Kensington Market", "Take the ferry to the Toronto Islands"],
    },
    CityProfile {
        key: "berlin",
        timezone: chrono_tz::Europe::Berlin,
        southern: false,
        facts: &[
            "Berlin has more bridges than Venice",
            "Museum Island is a UNESCO World Heritage site",
        ],
        activities: &["Visit the East Side Gallery", "Explore Museum Island", "Cycle through the Tiergarten"],
    },
    CityProfile {
        key: "rome",
        timezone: chrono_tz::Europe::Rome,
        southern: false,
        facts: &[
            "Rome was founded, according to legend, in 753 BC",
            "Vatican City is an independent state inside Rome",
        ],
        activities: &["Tour the Colosseum", "Visit the Vatican Museums", "Toss a coin into the Trevi Fountain"],
    },
    CityProfile {
        key: "dubai",
        timezone: chrono_tz::Asia::Dubai,
        southern: false,
        facts: &[
            "The Burj Khalifa is the tallest building in the world",
            "Summer temperatures regularly exceed 40°C",
        ],
        activities: &["Visit the Burj Khalifa observation deck", "Walk through the old souks", "Take a desert safari"],
    },
    CityProfile {
        key: "singapore",
        timezone: chrono_tz::Asia::Singapore,
        southern: false,
        facts: &[
            "Singapore sits about 137 km north of the equator",
            "Gardens by the Bay covers 101 hectares of reclaimed land",
        ],
        activities: &["Explore Gardens by the Bay", "Eat at a hawker centre", "Visit the Singapore Botanic Gardens"],
    },
    CityProfile {
        key: "cape town",
        timezone: chrono_tz::Africa::Johannesburg,
        southern: true,
        facts: &[
            "Table Mountain is one of the oldest mountains in the world",
            "Cape Town sits where the Atlantic meets the Indian Ocean currents",
        ],
        activities: &["Ride the Table Mountain cableway", "Visit Boulders Beach penguins", "Tour the V&A Waterfront"],
    },
];

fn find_profile(key: &str) -> Option<&'static CityProfile> {
    if key.is_empty() {
        return None;
    }
    CITY_PROFILES
        .iter()
        .find(|p| p.key == key)
        .or_else(|| {
            CITY_PROFILES
                .iter()
                .find(|p| p.key.contains(key) || key.contains(p.key))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    fn for_month(month: u32, southern: bool) -> Self {
        let northern = match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        };
        if !southern {
            return northern;
        }
        match northern {
            Season::Winter => Season::Summer,
            Season::Spring => Season::Autumn,
            Season::Summer => Season::Winter,
            Season::Autumn => Season::Spring,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

fn is_southern(location: &str, weather: &WeatherSnapshot, profile: Option<&CityProfile>) -> bool {
    let lower = location.to_lowercase();
    profile.map(|p| p.southern).unwrap_or(false)
        || ["australia", "new zealand", "south africa"]
            .iter()
            .any(|k| lower.contains(k))
        || matches!(weather.country.as_str(), "AU" | "NZ" | "ZA")
}

fn seasonal_info(season: Season, southern: bool, temperature: f64) -> String {
    let feel = match season {
        Season::Summer if temperature < 18.0 => "cooler than usual",
        Season::Winter if temperature > 15.0 => "milder than usual",
        _ if temperature >= 30.0 => "hot",
        _ if temperature <= 0.0 => "freezing",
        _ => "fairly typical",
    };
    let hemisphere = if southern { "southern" } else { "northern" };
    format!(
        "It is {} in the {} hemisphere, and {:.0}°C is {} for the season.",
        season.as_str(),
        hemisphere,
        temperature,
        feel
    )
}

fn weather_activities(weather: &WeatherSnapshot) -> Vec<&'static str> {
    let description = weather.description.to_lowercase();
    let mut extra = Vec::new();

    if weather.temperature > 25.0 {
        extra.push("Cool off at a pool or beach");
    } else if weather.temperature < 5.0 {
        extra.push("Warm up in a cafe or an indoor attraction");
    }
    if description.contains("rain") {
        extra.push("Explore covered markets and indoor galleries");
    } else if description.contains("clear") || description.contains("sunny") {
        extra.push("Take a walking tour while the skies are clear");
    }
    if weather.wind_speed > 10.0 {
        extra.push("Strong winds suit kite flying or sailing for the experienced");
    }
    extra
}

fn weather_tips(weather: &WeatherSnapshot, forecast: Option<&ForecastSnapshot>) -> Vec<String> {
    let description = weather.description.to_lowercase();
    let mut tips: Vec<&str> = Vec::new();

    if description.contains("rain") || description.contains("drizzle") || description.contains("thunder") {
        tips.push("Carry an umbrella or a rain jacket");
    }
    let rain_ahead = forecast
        .map(|f| f.days.iter().any(|d| d.precipitation_probability > 0.5))
        .unwrap_or(false);
    if rain_ahead {
        tips.push("Rain is likely in the coming days, so plan indoor alternatives");
    }
    if weather.temperature > 30.0 {
        tips.push("Stay hydrated and avoid the midday sun");
    } else if weather.temperature < 0.0 {
        tips.push("Dress in warm layers and watch for ice");
    }
    if weather.humidity > 80 {
        tips.push("High humidity makes breathable clothing a good choice");
    }
    if weather.wind_speed > 10.0 {
        tips.push("Expect strong winds near the coast and on high ground");
    }
    if description.contains("snow") {
        tips.push("Allow extra travel time on snowy roads");
    }
    if tips.is_empty() {
        tips.push("Conditions look comfortable for getting out and about");
    }

    tips.into_iter().take(MAX_TIPS).map(str::to_string).collect()
}

/// Context for `location` at the current time
pub fn generate(
    location: &str,
    weather: &WeatherSnapshot,
    forecast: Option<&ForecastSnapshot>,
) -> LocationContext {
    generate_at(location, weather, forecast, Utc::now())
}

/// Context for `location` at `now`
pub fn generate_at(
    location: &str,
    weather: &WeatherSnapshot,
    forecast: Option<&ForecastSnapshot>,
    now: DateTime<Utc>,
) -> LocationContext {
    let profile = find_profile(&location_key(location));
    let southern = is_southern(location, weather, profile);

    let (facts, mut activities) = match profile {
        Some(p) => (
            p.facts.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            p.activities.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        ),
        None => {
            tracing::debug!(location, "No city profile; using generic context");
            let place = weather.display_location();
            (
                vec![format!("{} is reporting {}", place, weather.description)],
                vec![
                    "Explore the local neighbourhoods on foot".to_string(),
                    "Ask locals for their favourite places to eat".to_string(),
                ],
            )
        }
    };

    for extra in weather_activities(weather) {
        if !activities.iter().any(|a| a == extra) {
            activities.push(extra.to_string());
        }
    }
    activities.truncate(MAX_ACTIVITIES);

    let (local_time, timezone) = match profile {
        Some(p) => {
            let local = now.with_timezone(&p.timezone);
            (
                local.format("%Y-%m-%d %H:%M %Z").to_string(),
                p.timezone.name().to_string(),
            )
        }
        None => {
            let local = now.with_timezone(&Local);
            (
                local.format("%Y-%m-%d %H:%M").to_string(),
                local.format("UTC%:z").to_string(),
            )
        }
    };

    LocationContext {
        facts,
        activities,
        seasonal_info: seasonal_info(
            Season::for_month(now.month(), southern),
            southern,
            weather.temperature,
        ),
        local_time,
        timezone,
        weather_tips: weather_tips(weather, forecast),
    }
}
