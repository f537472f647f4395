use scribe_relay::SplitOpts;
use scribe_relay::chunker::{pack, split_folder, split_transcript};
use scribe_relay::progress::list_inputs;
use scribe_relay::segments::segment_lines;

fn transcript_with_turns(turns: usize, chars_per_turn: usize) -> String {
    let mut text = String::new();
    for i in 0..turns {
        text.push_str(&format!("Speaker 00:0{i}:00\n"));
        // One long body line per turn.
        text.push_str(&"字".repeat(chars_per_turn));
        text.push('\n');
    }
    text
}

#[test]
fn three_turns_of_3000_chars_make_two_chunks() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("live.txt");
    std::fs::write(&input, transcript_with_turns(3, 3000))?;

    let lines: Vec<String> = std::fs::read_to_string(&input)?
        .lines()
        .map(str::to_string)
        .collect();
    let segments = segment_lines(&lines);
    assert_eq!(segments.len(), 3);

    let chunks = pack(&segments, 8000);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].segment_count, 2);
    assert_eq!(chunks[1].segment_count, 1);

    let out_root = dir.path().join("Text");
    let written = split_transcript(&input, &out_root, &SplitOpts::default())?;
    assert_eq!(
        written,
        vec![
            out_root.join("live").join("live_1.txt"),
            out_root.join("live").join("live_2.txt"),
        ]
    );

    // The chunk files put back together are the transcript.
    let rebuilt: String = written
        .iter()
        .map(std::fs::read_to_string)
        .collect::<std::io::Result<Vec<_>>>()?
        .concat();
    assert_eq!(rebuilt, std::fs::read_to_string(&input)?);
    Ok(())
}

#[test]
fn split_folder_handles_each_transcript_separately() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input_dir = dir.path().join("LiveStreamerText");
    std::fs::create_dir_all(&input_dir)?;
    std::fs::write(input_dir.join("a.txt"), transcript_with_turns(2, 10))?;
    std::fs::write(input_dir.join("b.txt"), transcript_with_turns(4, 10))?;
    std::fs::write(input_dir.join("notes.md"), "ignored")?;
    std::fs::write(input_dir.join("broken.txt"), [0xff, 0xfe])?;

    let out_root = dir.path().join("Text");
    let opts = SplitOpts {
        threshold: 60,
        ..SplitOpts::default()
    };
    let report = split_folder(&input_dir, &out_root, &opts)?;

    assert_eq!(report.transcripts, 2);
    assert_eq!(report.failed, vec![input_dir.join("broken.txt")]);

    let a = list_inputs(&out_root.join("a"), &["txt"])?;
    let b = list_inputs(&out_root.join("b"), &["txt"])?;
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 2);
    assert_eq!(report.chunks, 3);
    Ok(())
}
