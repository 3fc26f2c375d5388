//! Built-in landmark set used when the data file is missing or unreadable.

use super::Landmark;

/// Number of landmarks in the embedded fallback set.
pub const EMBEDDED_LANDMARK_COUNT: usize = 7;

/// Build gallery asset keys `PREFIX1..=PREFIXn`, skipping any listed index.
fn gallery(prefix: &str, count: u32, skip: &[u32]) -> Vec<String> {
    (1..=count)
        .filter(|i| !skip.contains(i))
        .map(|i| format!("{}{}", prefix, i))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn landmark(
    id: &str,
    name: &str,
    description: &str,
    latitude: f64,
    longitude: f64,
    main_image_name: &str,
    gallery: Vec<String>,
    historical_year: &str,
) -> Landmark {
    Landmark {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        latitude,
        longitude,
        main_image_name: main_image_name.to_string(),
        gallery,
        historical_year: Some(historical_year.to_string()),
    }
}

/// The embedded Naples landmark set.
pub fn embedded_landmarks() -> Vec<Landmark> {
    vec![
        landmark(
            "castel_ovo",
            "Castel dell’Ovo",
            "Historic castle located on the former island of Megaride.",
            40.826089,
            14.251480,
            "CdoMain",
            gallery("CDO", 16, &[]),
            "1100",
        ),
        landmark(
            "test_home",
            "Test Monument (Near You)",
            "A test landmark for exercising the unlock flow on a device.",
            40.84735,
            14.26789,
            "test_main",
            vec!["castel_1".to_string()],
            "2024",
        ),
        landmark(
            "piazza_del_plebiscito",
            "Piazza del Plebiscito",
            "Naples’ grand central square, framed by the Royal Palace and the Basilica of San Francesco di Paola.",
            40.835674,
            14.247965,
            "PdpMain",
            gallery("PDP", 36, &[10]),
            "1800s",
        ),
        landmark(
            "galleria_umberto",
            "Galleria Umberto I",
            "A 19th-century public shopping gallery with a glass dome and ornate architecture.",
            40.837992,
            14.249585,
            "GuMain",
            gallery("GU", 13, &[]),
            "1890",
        ),
        landmark(
            "castel_nuovo",
            "Castel Nuovo",
            "A medieval castle overlooking the port, one of the city's most iconic landmarks.",
            40.838650,
            14.254779,
            "CnMain",
            gallery("CN", 24, &[]),
            "1279",
        ),
        landmark(
            "castel_santelmo",
            "Castel Sant’Elmo",
            "A star-shaped fortress on Vomero hill with panoramic views over the bay.",
            40.842596,
            14.236369,
            "CseMain",
            gallery("CSE", 13, &[]),
            "1329",
        ),
        landmark(
            "piazza_dante",
            "Piazza Dante",
            "A historic square dedicated to Dante Alighieri, a lively hub near Via Toledo.",
            40.8493,
            14.2516,
            "PdMain",
            gallery("PD", 19, &[]),
            "18th century",
        ),
    ]
}
