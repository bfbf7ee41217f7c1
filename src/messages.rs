use teloxide::utils::markdown::{bold, escape};

use crate::picker::Cooldown;
use crate::stats::ChatStats;

pub fn help() -> String {
    escape(
        "Поддерживаемые команды:\n\
         /pick — выбрать дежурных на сегодня\n\
         /stat — статистика по чату\n\
         /help — показать этот текст",
    )
}

pub fn group_only() -> String {
    escape("Команда работает только в группах.")
}

pub fn picked(first: &str, second: &str) -> String {
    escape(&format!("Сегодня дежурят: @{first} и @{second}!"))
}

pub fn on_cooldown(cooldown: &Cooldown) -> String {
    match &cooldown.today {
        Some((first, second)) => escape(&format!(
            "Дежурные на сегодня: @{first} и @{second}.\n\
             Следующий выбор возможен через {} час(ов).",
            cooldown.hours_left
        )),
        None => escape("Выбор уже был, но данные за сегодня не сохранились."),
    }
}

pub fn not_enough_candidates() -> String {
    escape("Недостаточно кандидатов (нужно минимум 2).")
}

pub fn admin_list_failed() -> String {
    escape("Ошибка: не удалось получить список администраторов.")
}

pub fn no_stats() -> String {
    escape("Ещё не было ни одного выбора.")
}

pub fn stats(stats: &ChatStats) -> String {
    let mut msg = bold(&escape("📊 Статистика по чату")) + "\n\n";

    msg += &bold(&escape("Дежурные сегодня:"));
    msg += "\n";
    msg += &if stats.today.is_empty() {
        escape("—")
    } else {
        escape(&stats.today.join("\n"))
    };

    msg += "\n\n";
    msg += &bold(&escape("ТОП-10 за месяц:"));
    msg += "\n";
    msg += &top_section(&stats.month_top);

    msg += "\n\n";
    msg += &bold(&escape("ТОП-10 за всё время:"));
    msg += "\n";
    msg += &top_section(&stats.all_time_top);

    msg
}

fn top_section(entries: &[(String, u32)]) -> String {
    if entries.is_empty() {
        return escape("—");
    }

    entries
        .iter()
        .map(|(name, count)| escape(&format!("{name} — {count} раз(а)")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_message_lists_every_section() {
        let stats = ChatStats {
            today: vec!["alice".to_string(), "bob".to_string()],
            month_top: vec![("alice".to_string(), 3), ("bob".to_string(), 1)],
            all_time_top: vec![],
        };

        let msg = super::stats(&stats);
        assert!(msg.contains("alice"));
        assert!(msg.contains("3 раз"));
        // empty all-time section falls back to the placeholder
        assert!(msg.contains("—"));
    }

    #[test]
    fn cooldown_message_names_the_pair_and_the_wait() {
        let with_pair = Cooldown {
            today: Some(("alice".to_string(), "bob".to_string())),
            hours_left: 5,
        };
        let msg = on_cooldown(&with_pair);
        assert!(msg.contains("@alice"));
        assert!(msg.contains("@bob"));
        assert!(msg.contains('5'));

        let without = Cooldown {
            today: None,
            hours_left: 5,
        };
        assert!(on_cooldown(&without).contains("не сохранились"));
    }
}
