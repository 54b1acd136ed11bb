//! Member roster dump as plain SQL, for seeding another database.

use storage::models::Member;

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_opt(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_else(|| "NULL".to_string())
}

pub fn member_insert(member: &Member) -> String {
    format!(
        "INSERT INTO club_member (id, full_name, av_number, gender_code, division_code, birth_year, is_recorder) \
         VALUES ({}, {}, {}, {}, {}, {}, {});",
        member.member_id,
        quote(&member.full_name),
        quote_opt(member.av_number.as_deref()),
        quote(&member.gender_code),
        quote(&member.division_code),
        member.birth_year,
        member.is_recorder,
    )
}

/// One INSERT per member, ordered by id, followed by a sequence reset so new
/// rows do not collide with the imported ids.
pub fn members_script(members: &[Member]) -> String {
    let mut sorted: Vec<&Member> = members.iter().collect();
    sorted.sort_by_key(|m| m.member_id);

    let mut script = String::from("BEGIN;\n");
    for member in sorted {
        script.push_str(&member_insert(member));
        script.push('\n');
    }
    script.push_str(
        "SELECT setval(pg_get_serial_sequence('club_member', 'id'), \
         COALESCE((SELECT MAX(id) FROM club_member), 1));\n",
    );
    script.push_str("COMMIT;\n");
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn member(member_id: i32, full_name: &str, av_number: Option<&str>) -> Member {
        Member {
            member_id,
            full_name: full_name.to_string(),
            av_number: av_number.map(String::from),
            gender_code: "F".to_string(),
            division_code: "R".to_string(),
            birth_year: 1988,
            is_recorder: false,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_quotes_are_escaped() {
        let sql = member_insert(&member(7, "Aoife O'Brien", Some("VIC042")));
        assert_eq!(
            sql,
            "INSERT INTO club_member (id, full_name, av_number, gender_code, division_code, birth_year, is_recorder) \
             VALUES (7, 'Aoife O''Brien', 'VIC042', 'F', 'R', 1988, false);"
        );
    }

    #[test]
    fn test_missing_av_number_is_null() {
        let sql = member_insert(&member(3, "Ben", None));
        assert!(sql.contains("'Ben', NULL, 'F'"));
    }

    #[test]
    fn test_script_is_ordered_and_wrapped() {
        let script = members_script(&[member(9, "Zed", None), member(2, "Amy", None)]);
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines.first(), Some(&"BEGIN;"));
        assert!(lines[1].contains("VALUES (2, 'Amy'"));
        assert!(lines[2].contains("VALUES (9, 'Zed'"));
        assert_eq!(lines.last(), Some(&"COMMIT;"));
    }
}
