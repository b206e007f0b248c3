/*!

This is the long-form manual for `survey_summary` and `survey-report`.

## Input formats

The input is a spreadsheet whose first row is the header and every other row
is one survey response. The format is chosen from the file extension:
* `csv` Comma Separated Values, UTF-8
* `xlsx`, `xlsm`, `xls`, `xlsb`, `ods` workbooks. The first worksheet is read
  unless `--excel-worksheet-name` is given.

Fully empty rows are skipped. Rows may be shorter than the header (the
missing cells are empty) but not longer.

Blank header cells are named `Unnamed: <index>`. When the same name appears
several times, the later occurences are renamed `<name>.1`, `<name>.2`...

## Missing values

A cell is considered missing when it is empty or when its text is one of
`n/a`, `na`, `nan`, `#n/a`, `null` (in any case). Missing cells:
- are printed as `N/A` in the committee reports, or left out for the items
  that are marked `skipIfMissing`
- are counted apart in the statistics and never enter a mean
- exclude a record from the committee grouping

A cell is numeric when it is a number in the workbook, or a text that reads as
a finite number (`" 4 "`, `"3.5"`). Other cells are counted as non-numeric in
the statistics.

## Finding columns

Survey tools produce long column titles that change slightly between
editions, so the configuration refers to columns through patterns:

| JSON                                   | meaning                                      |
|----------------------------------------|----------------------------------------------|
| `"Committee"`                          | the column named exactly `Committee`         |
| `["hours", "chair"]`                   | the first column containing all the words    |
| `{"anyOf": [["council"], ["board"]]}`  | the first of the alternatives that matches   |

Matching ignores case and treats any run of spaces, tabs or line breaks as a
single space. The spaces at the start or the end of a needle are kept: the
needle `"objective 1 - q1 "` does not match `Objective 1 - Q10 ...`.

Inside the `objectives` and `objectiveColumns` settings, `{n}` stands for the
objective number and `{ordinal}` for its English ordinal (`2nd`, `3rd`...).

## Templates

Titles, authors, dates and the footer are LaTeX templates where
`{{name}}` is replaced by a value:
- `group` the committee name (`All committees` in the overall report)
- `date` the date stamp of the report
- `generated` the day of the run, as `YYYY-MM-DD`
- `year` and `period` the reporting period found in the data

Values are escaped, the rest of the template is copied as is. Use `{{{name}}}`
to put a placeholder directly inside braces.

## Configuration

Run `survey-report default-config` to get the built-in configuration, which
matches the committee survey of the strategic plan. It is a good starting
point for a custom file, passed with `--config`. The main entries:

- `groupColumn` the column with the committee name
- `statistics` the statistics of the summary sections, each with a `label`,
  a `column`, a `kind` (`mean` or `distribution`), an optional `unit` and an
  `optional` flag. A statistic whose column is absent is an error, unless it
  is optional.
- `objectives` how many objectives a response may have and which column says
  whether objective `{n}` is filled in
- `overall` the layout of the overall report: strategic goal sections and the
  columns of an objective
- `committee` the layout of the committee reports: sections and their items

## Compiling

The PDF files are produced by `pdflatex` by default. Any compatible program
can be used with `--latex`, and `--no-pdf` only writes the LaTeX sources.
The compiler output is printed when a document does not compile.

*/
