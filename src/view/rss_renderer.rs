use std::io::Cursor;

use chrono::NaiveDateTime;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/* Example
<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
<channel>
  <title>The Example Blog</title>
  <link>http://example.com</link>
  <description>Sparse thoughts</description>
  <lastBuildDate>Sat, 17 Oct 2026 10:00:00 +0000</lastBuildDate>
  <item>
    <title>What I learned</title>
    <link>http://example.com/2012/12/19/what-i-learned</link>
    <guid>http://example.com/2012/12/19/what-i-learned</guid>
    <description><![CDATA[<p>How to be a great software engineer?</p>]]></description>
    <pubDate>Wed, 19 Dec 2012 20:10:12 +0000</pubDate>
  </item>
</channel>
</rss>
*/

pub struct FeedItem<'a> {
    pub title: &'a str,
    pub link: &'a str,
    pub description: &'a str,
    pub guid: &'a str,
    pub pub_date: NaiveDateTime,
}

pub struct RssChannel<'a> {
    pub ch_title: &'a str,
    pub ch_link: &'a str,
    pub ch_desc: &'a str,
    pub last_build_date: NaiveDateTime,
}

impl<'a> RssChannel<'a> {
    /// Items are written in the order given.
    pub fn render(&self, items: &[FeedItem]) -> quick_xml::Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        let decl = Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None));
        writer.write_event(decl)?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        push_text(&mut writer, "title", self.ch_title)?;
        push_text(&mut writer, "link", self.ch_link)?;
        push_text(&mut writer, "description", self.ch_desc)?;
        push_text(&mut writer, "lastBuildDate", &self.last_build_date.and_utc().to_rfc2822())?;

        for item in items {
            writer.write_event(Event::Start(BytesStart::new("item")))?;

            push_text(&mut writer, "title", item.title)?;
            push_text(&mut writer, "link", item.link)?;
            push_text(&mut writer, "guid", item.guid)?;
            push_cdata(&mut writer, "description", item.description)?;
            push_text(&mut writer, "pubDate", &item.pub_date.and_utc().to_rfc2822())?;

            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(writer.into_inner().into_inner())
    }
}

fn push_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn push_cdata(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    if text.contains("]]>") {
        let new_text = text.replace("]]>", "]] >");
        writer.write_event(Event::CData(BytesCData::new(&new_text)))?;
    } else {
        writer.write_event(Event::CData(BytesCData::new(text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
