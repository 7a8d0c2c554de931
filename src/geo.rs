//! Lat/long ↔ UTM conversion on the WGS84 ellipsoid.
//!
//! Equations from USGS Bulletin 1532. East longitudes are positive, west
//! longitudes are negative; north latitudes are positive, south latitudes
//! are negative. Lat and long are in decimal degrees.

use std::f64::consts::PI;

pub const WGS84_A: f64 = 6378137.0;
pub const WGS84_ECCSQ: f64 = 0.00669437999013;

const K0: f64 = 0.9996;

/// A projected UTM coordinate. Northing and easting are in meters and
/// include the standard false offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtmCoord {
    pub northing: f64,
    pub easting: f64,
    pub zone: UtmZone,
}

/// A UTM grid zone: longitudinal zone number (1-60) plus latitude band
/// letter. The letter is `'Z'` when the latitude is outside the UTM limits
/// of 84N to 80S; that is a sentinel, not an error, and callers that care
/// must check for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub letter: char,
}

impl UtmZone {
    pub fn is_northern(&self) -> bool {
        self.letter >= 'N'
    }
}

impl std::fmt::Display for UtmZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, self.letter)
    }
}

/// Determines the correct UTM letter designator for the given latitude.
/// Returns `'Z'` if the latitude is outside the UTM limits of 84N to 80S.
pub fn utm_letter_designator(latitude: f64) -> char {
    if (84.0 >= latitude) && (latitude >= 72.0) {
        'X'
    } else if (72.0 > latitude) && (latitude >= 64.0) {
        'W'
    } else if (64.0 > latitude) && (latitude >= 56.0) {
        'V'
    } else if (56.0 > latitude) && (latitude >= 48.0) {
        'U'
    } else if (48.0 > latitude) && (latitude >= 40.0) {
        'T'
    } else if (40.0 > latitude) && (latitude >= 32.0) {
        'S'
    } else if (32.0 > latitude) && (latitude >= 24.0) {
        'R'
    } else if (24.0 > latitude) && (latitude >= 16.0) {
        'Q'
    } else if (16.0 > latitude) && (latitude >= 8.0) {
        'P'
    } else if (8.0 > latitude) && (latitude >= 0.0) {
        'N'
    } else if (0.0 > latitude) && (latitude >= -8.0) {
        'M'
    } else if (-8.0 > latitude) && (latitude >= -16.0) {
        'L'
    } else if (-16.0 > latitude) && (latitude >= -24.0) {
        'K'
    } else if (-24.0 > latitude) && (latitude >= -32.0) {
        'J'
    } else if (-32.0 > latitude) && (latitude >= -40.0) {
        'H'
    } else if (-40.0 > latitude) && (latitude >= -48.0) {
        'G'
    } else if (-48.0 > latitude) && (latitude >= -56.0) {
        'F'
    } else if (-56.0 > latitude) && (latitude >= -64.0) {
        'E'
    } else if (-64.0 > latitude) && (latitude >= -72.0) {
        'D'
    } else if (-72.0 > latitude) && (latitude >= -80.0) {
        'C'
    } else {
        'Z'
    }
}

/// Computes the UTM zone number for a point, including the Norway and
/// Svalbard exceptions to the regular 6° grid.
pub fn utm_zone_number(latitude: f64, longitude: f64) -> u8 {
    let mut zone_number = ((longitude + 180.0) / 6.0) as i32 + 1;

    if latitude >= 56.0 && latitude < 64.0 && longitude >= 3.0 && longitude < 12.0 {
        zone_number = 32;
    }

    // special zones for Svalbard
    if latitude >= 72.0 && latitude < 84.0 {
        if longitude >= 0.0 && longitude < 9.0 {
            zone_number = 31;
        } else if longitude >= 9.0 && longitude < 21.0 {
            zone_number = 33;
        } else if longitude >= 21.0 && longitude < 33.0 {
            zone_number = 35;
        } else if longitude >= 33.0 && longitude < 42.0 {
            zone_number = 37;
        }
    }

    zone_number as u8
}

/// Converts lat/long to UTM coordinates.
pub fn ll_to_utm(latitude: f64, longitude: f64) -> UtmCoord {
    let lat_rad = latitude * PI / 180.0;
    let long_rad = longitude * PI / 180.0;

    let zone_number = utm_zone_number(latitude, longitude);

    // +3 puts origin in middle of zone
    let long_origin = (zone_number as f64 - 1.0) * 6.0 - 180.0 + 3.0;
    let long_origin_rad = long_origin * PI / 180.0;

    let ecc_prime_sq = WGS84_ECCSQ / (1.0 - WGS84_ECCSQ);

    let n = WGS84_A / (1.0 - WGS84_ECCSQ * lat_rad.sin() * lat_rad.sin()).sqrt();
    let t = lat_rad.tan() * lat_rad.tan();
    let c = ecc_prime_sq * lat_rad.cos() * lat_rad.cos();
    let a = lat_rad.cos() * (long_rad - long_origin_rad);

    let m = WGS84_A
        * ((1.0 - WGS84_ECCSQ / 4.0
            - 3.0 * WGS84_ECCSQ * WGS84_ECCSQ / 64.0
            - 5.0 * WGS84_ECCSQ * WGS84_ECCSQ * WGS84_ECCSQ / 256.0)
            * lat_rad
            - (3.0 * WGS84_ECCSQ / 8.0
                + 3.0 * WGS84_ECCSQ * WGS84_ECCSQ / 32.0
                + 45.0 * WGS84_ECCSQ * WGS84_ECCSQ * WGS84_ECCSQ / 1024.0)
                * (2.0 * lat_rad).sin()
            + (15.0 * WGS84_ECCSQ * WGS84_ECCSQ / 256.0
                + 45.0 * WGS84_ECCSQ * WGS84_ECCSQ * WGS84_ECCSQ / 1024.0)
                * (4.0 * lat_rad).sin()
            - (35.0 * WGS84_ECCSQ * WGS84_ECCSQ * WGS84_ECCSQ / 3072.0) * (6.0 * lat_rad).sin());

    let easting = K0
        * n
        * (a + (1.0 - t + c) * a * a * a / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ecc_prime_sq) * a * a * a * a * a / 120.0)
        + 500000.0;

    let mut northing = K0
        * (m + n
            * lat_rad.tan()
            * (a * a / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a * a * a * a / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ecc_prime_sq)
                    * a
                    * a
                    * a
                    * a
                    * a
                    * a
                    / 720.0));

    if latitude < 0.0 {
        // 10,000,000 meter offset for southern hemisphere
        northing += 10000000.0;
    }

    UtmCoord {
        northing,
        easting,
        zone: UtmZone {
            number: zone_number,
            letter: utm_letter_designator(latitude),
        },
    }
}

/// Converts UTM coordinates back to lat/long (decimal degrees).
pub fn utm_to_ll(coord: UtmCoord) -> (f64, f64) {
    let e1 = (1.0 - (1.0 - WGS84_ECCSQ).sqrt()) / (1.0 + (1.0 - WGS84_ECCSQ).sqrt());

    // remove 500,000 meter offset for longitude
    let x = coord.easting - 500000.0;
    let mut y = coord.northing;

    if !coord.zone.is_northern() {
        // remove 10,000,000 meter offset used for southern hemisphere
        y -= 10000000.0;
    }

    // +3 puts origin in middle of zone
    let long_origin = (coord.zone.number as f64 - 1.0) * 6.0 - 180.0 + 3.0;

    let ecc_prime_sq = WGS84_ECCSQ / (1.0 - WGS84_ECCSQ);

    let m = y / K0;
    let mu = m / (WGS84_A
        * (1.0 - WGS84_ECCSQ / 4.0
            - 3.0 * WGS84_ECCSQ * WGS84_ECCSQ / 64.0
            - 5.0 * WGS84_ECCSQ * WGS84_ECCSQ * WGS84_ECCSQ / 256.0));

    let phi1_rad = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1 * e1 * e1 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1 * e1 / 16.0 - 55.0 * e1 * e1 * e1 * e1 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1 * e1 * e1 / 96.0) * (6.0 * mu).sin();

    let n1 = WGS84_A / (1.0 - WGS84_ECCSQ * phi1_rad.sin() * phi1_rad.sin()).sqrt();
    let t1 = phi1_rad.tan() * phi1_rad.tan();
    let c1 = ecc_prime_sq * phi1_rad.cos() * phi1_rad.cos();
    let r1 = WGS84_A * (1.0 - WGS84_ECCSQ)
        / (1.0 - WGS84_ECCSQ * phi1_rad.sin() * phi1_rad.sin()).powf(1.5);
    let d = x / (n1 * K0);

    let mut latitude = phi1_rad
        - (n1 * phi1_rad.tan() / r1)
            * (d * d / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ecc_prime_sq) * d * d * d * d
                    / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * ecc_prime_sq
                    - 3.0 * c1 * c1)
                    * d
                    * d
                    * d
                    * d
                    * d
                    * d
                    / 720.0);
    latitude *= 180.0 / PI;

    let mut longitude = (d - (1.0 + 2.0 * t1 + c1) * d * d * d / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ecc_prime_sq + 24.0 * t1 * t1)
            * d
            * d
            * d
            * d
            * d
            / 120.0)
        / phi1_rad.cos();
    longitude = long_origin + longitude / PI * 180.0;

    (latitude, longitude)
}
