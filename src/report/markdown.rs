//! Markdown summary of a `ReportModel`.

use super::model::ReportModel;

/// Contacts listed in the summary table.
const CONTACT_ROWS: usize = 20;

/// Render the Markdown summary. Pure formatting over the model.
pub fn render_summary(report: &ReportModel) -> String {
    let mut md = String::new();
    let o = &report.overview;

    md.push_str("# Outbound Messaging Report\n\n");
    md.push_str(&format!("**Analyzed as:** {}\n", o.self_identity));
    if let (Some(first), Some(last)) = (o.first_message_at, o.last_message_at) {
        md.push_str(&format!(
            "**Period:** {} to {}\n",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ));
    }
    md.push('\n');

    md.push_str("## Overview\n\n");
    md.push_str(&format!(
        "- Messages: {} ({} sent, {} received)\n",
        o.total_messages, o.outbound_messages, o.inbound_messages
    ));
    md.push_str(&format!(
        "- Threads: {} ({} started by you, {} started by others)\n",
        o.total_threads, o.self_initiated_threads, o.other_initiated_threads
    ));
    md.push_str(&format!("- Contacts: {}\n", o.unique_contacts));
    md.push_str(&format!("- Sales messages: {}\n", o.sales_messages));
    if let (Some(score), Some(label)) = (o.avg_outbound_sentiment, &o.outbound_sentiment_label) {
        md.push_str(&format!("- Outbound sentiment: {:.2} ({})\n", score, label));
    }
    md.push('\n');

    let load = &report.load_summary;
    if load.dropped_rows > 0 || load.timestamp_warnings > 0 {
        md.push_str("## Data Quality\n\n");
        md.push_str(&format!("- Rows read: {}\n", load.rows_read));
        md.push_str(&format!("- Rows dropped: {}\n", load.dropped_rows));
        md.push_str(&format!("- Unparseable dates: {}\n", load.timestamp_warnings));
        md.push('\n');
    }

    let f = &report.funnel;
    md.push_str("## Outbound Funnel\n\n");
    md.push_str(&format!("- Conversations you started: {}\n", f.threads_initiated));
    md.push_str(&format!(
        "- Got a reply: {} ({})\n",
        f.threads_replied,
        percent(f.response_rate)
    ));
    md.push_str(&format!("- Average response time: {}\n", hours(f.avg_response_time_hours)));
    md.push_str(&format!("- Median response time: {}\n", hours(f.median_response_time_hours)));
    md.push_str(&format!(
        "- Replies within {}h: {} ({})\n",
        f.quick_response_hours,
        f.quick_replies,
        percent(f.quick_reply_share)
    ));
    md.push_str(&format!(
        "- Average follow-ups: {}\n",
        f.avg_follow_ups.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "n/a".into())
    ));
    md.push_str(&format!(
        "- Replies that needed a follow-up: {} ({})\n",
        f.replies_after_follow_up,
        percent(f.follow_up_reply_share)
    ));
    md.push('\n');

    md.push_str("## Sales Categories\n\n");
    md.push_str("| Category | Messages | Openers | Replied | Response Rate | Avg Sentiment |\n");
    md.push_str("|---|---|---|---|---|---|\n");
    for c in report.categories.iter().filter(|c| c.outbound_messages > 0 || c.first_messages > 0) {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            c.label,
            c.outbound_messages,
            c.first_messages,
            c.threads_replied,
            percent(c.response_rate),
            c.avg_sentiment.map(|s| format!("{:.2}", s)).unwrap_or_else(|| "n/a".into())
        ));
    }
    let s = &report.sales_comparison;
    md.push_str(&format!(
        "\nSales openers: {} ({} threads). Non-sales openers: {} ({} threads).\n\n",
        percent(s.sales_response_rate),
        s.sales_threads,
        percent(s.non_sales_response_rate),
        s.non_sales_threads
    ));

    let st = &report.starters;
    if st.total_starters > 0 {
        md.push_str("## Conversation Starters\n\n");
        md.push_str(&format!(
            "- Starters: {} ({} got a reply, {})\n",
            st.total_starters,
            st.successful_starters,
            percent(st.response_rate)
        ));
        md.push_str(&format!(
            "- Average length: {}\n\n",
            st.avg_length.map(|v| format!("{:.0} chars", v)).unwrap_or_else(|| "n/a".into())
        ));
        md.push_str("| Type | Sent | Replied | Response Rate | Avg Response | Avg Length |\n");
        md.push_str("|---|---|---|---|---|---|\n");
        for t in &st.by_type {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                t.label,
                t.starters,
                t.replied,
                percent(Some(t.response_rate)),
                hours(t.avg_response_time_hours),
                t.avg_length.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "n/a".into())
            ));
        }
        if !st.best_starters.is_empty() {
            md.push_str("\nBest starters:\n\n");
            for (i, b) in st.best_starters.iter().enumerate() {
                md.push_str(&format!(
                    "{}. score {:.2}, {} to {}\n   > {}\n",
                    i + 1,
                    b.score,
                    b.starter_type.label(),
                    b.contact,
                    excerpt(&b.content, 120)
                ));
            }
        }
        md.push('\n');
    }

    let dc = &report.direction_comparison;
    if dc.outbound.messages > 0 || dc.inbound.messages > 0 {
        md.push_str("## Sent vs Received\n\n");
        md.push_str("| | Messages | Avg Length | Avg Words | Avg Sentiment | With Question |\n");
        md.push_str("|---|---|---|---|---|---|\n");
        for (label, d) in [("Sent", &dc.outbound), ("Received", &dc.inbound)] {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                label,
                d.messages,
                d.avg_length.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "n/a".into()),
                d.avg_word_count.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "n/a".into()),
                d.avg_sentiment.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".into()),
                d.with_question
            ));
        }
        md.push('\n');
    }

    if !report.top_templates.is_empty() {
        md.push_str("## Top Templates\n\n");
        for (i, t) in report.top_templates.iter().enumerate() {
            let flag = if t.low_confidence { " _(single use)_" } else { "" };
            md.push_str(&format!(
                "{}. **{}** reply rate, sent {}x{}\n   > {}\n",
                i + 1,
                percent(Some(t.response_rate)),
                t.size,
                flag,
                excerpt(&t.sample, 120)
            ));
        }
        md.push('\n');
    }

    if !report.contacts.is_empty() {
        md.push_str("## Contacts\n\n");
        md.push_str("| Contact | Started | Replied | Response Rate | Avg Response | Top Category |\n");
        md.push_str("|---|---|---|---|---|---|\n");
        for c in report.contacts.iter().take(CONTACT_ROWS) {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                c.contact_id,
                c.threads_initiated,
                c.threads_replied,
                percent(Some(c.response_rate)),
                hours(c.avg_response_time_hours),
                c.top_category.map(|t| t.label()).unwrap_or("-")
            ));
        }
        if report.contacts.len() > CONTACT_ROWS {
            md.push_str(&format!("\n_{} more contacts in the JSON report._\n", report.contacts.len() - CONTACT_ROWS));
        }
        md.push('\n');
    }

    if !report.ghosted_contacts.is_empty() {
        md.push_str(&format!("## No Reply ({})\n\n", report.ghosted_contacts.len()));
        for name in &report.ghosted_contacts {
            md.push_str(&format!("- {}\n", name));
        }
        md.push('\n');
    }

    let a = &report.anomalies;
    if !a.threads_without_self.is_empty() || !a.threads_without_timestamps.is_empty() {
        md.push_str("## Excluded Threads\n\n");
        md.push_str(&format!(
            "- Without you as a participant: {}\n",
            a.threads_without_self.len()
        ));
        md.push_str(&format!("- Without any readable date: {}\n", a.threads_without_timestamps.len()));
    }

    md
}

fn percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}%", v * 100.0)).unwrap_or_else(|| "n/a".into())
}

fn hours(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}h", v)).unwrap_or_else(|| "n/a".into())
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
