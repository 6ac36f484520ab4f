use crate::core::message::international_number;
use crate::domain::model::{Participant, ParticipantId, RejectedRow, Roster};
use crate::domain::ports::Storage;
use crate::utils::error::{Result, SantaError};
use csv::{ReaderBuilder, StringRecord, Trim};
use regex::Regex;
use std::collections::HashSet;
use std::io::Read;

const PHONE_PATTERN: &str = r"^\+?[0-9]{6,15}$";

/// 讀取參加者名單 CSV
///
/// Expected columns: `status,name,phone[,partner_name,partner_phone]` with a
/// header row. Rows that cannot be used are collected in `Roster::rejected`,
/// or abort the load when `strict` is set. Phone numbers must be unique once
/// `country_prefix` has been applied.
pub fn parse_roster<R: Read>(reader: R, strict: bool, country_prefix: &str) -> Result<Roster> {
    let phone_re = Regex::new(PHONE_PATTERN).map_err(|e| SantaError::ConfigError {
        message: format!("Invalid phone pattern: {}", e),
    })?;

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    if csv_reader.headers()?.is_empty() {
        return Err(SantaError::RosterError {
            message: "participant file is empty".to_string(),
        });
    }

    let mut roster = Roster::default();
    let mut couple_counter = 0usize;

    for record in csv_reader.records() {
        let record = record?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match parse_row(&record, &phone_re, &mut couple_counter) {
            Ok(people) => {
                for (name, phone, group) in people {
                    let id = ParticipantId(roster.participants.len() as u32);
                    roster.participants.push(Participant {
                        id,
                        name,
                        contact: phone,
                        exclusion_group: group,
                    });
                }
            }
            Err(reason) => {
                if strict {
                    return Err(SantaError::RosterError {
                        message: format!("line {}: {}", line, reason),
                    });
                }
                roster.rejected.push(RejectedRow { line, reason });
            }
        }
    }

    check_unique_phones(&roster.participants, country_prefix)?;
    Ok(roster)
}

pub async fn load_roster<S: Storage>(
    storage: &S,
    path: &str,
    strict: bool,
    country_prefix: &str,
) -> Result<Roster> {
    let data = storage.read_file(path).await?;
    parse_roster(data.as_slice(), strict, country_prefix)
}

type ParsedPerson = (String, String, Option<String>);

fn parse_row(
    record: &StringRecord,
    phone_re: &Regex,
    couple_counter: &mut usize,
) -> std::result::Result<Vec<ParsedPerson>, String> {
    let status = record.get(0).unwrap_or_default().to_lowercase();

    match status.as_str() {
        "single" => {
            if record.len() < 3 {
                return Err(format!("single entry needs 3 fields, found {}", record.len()));
            }
            let (name, phone) = person(record, 1, phone_re)?;
            Ok(vec![(name, phone, None)])
        }
        "couple" => {
            if record.len() < 5 {
                return Err(format!("couple entry needs 5 fields, found {}", record.len()));
            }
            let first = person(record, 1, phone_re)?;
            let second = person(record, 3, phone_re)?;

            let group = format!("couple{}", couple_counter);
            *couple_counter += 1;

            Ok(vec![
                (first.0, first.1, Some(group.clone())),
                (second.0, second.1, Some(group)),
            ])
        }
        _ => Err(format!(
            "invalid status '{}', expected 'single' or 'couple'",
            record.get(0).unwrap_or_default()
        )),
    }
}

fn person(
    record: &StringRecord,
    at: usize,
    phone_re: &Regex,
) -> std::result::Result<(String, String), String> {
    let name = record.get(at).unwrap_or_default();
    let phone = record.get(at + 1).unwrap_or_default();

    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if !phone_re.is_match(&normalize_phone(phone)) {
        return Err(format!("invalid phone number for '{}'", name));
    }
    Ok((name.to_string(), phone.to_string()))
}

/// Removes the spaces people like to type inside phone numbers.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| !c.is_whitespace()).collect()
}

// 比較的是實際寄送的號碼
fn check_unique_phones(participants: &[Participant], country_prefix: &str) -> Result<()> {
    let mut seen = HashSet::new();
    for participant in participants {
        if !seen.insert(international_number(&participant.contact, country_prefix)) {
            return Err(SantaError::RosterError {
                message: format!(
                    "phone number of '{}' is already used by another participant",
                    participant.name
                ),
            });
        }
    }
    Ok(())
}
